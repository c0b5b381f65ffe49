#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use actix_web::cookie::Cookie;
use actix_web::dev::ServerHandle;
use actix_web::http::StatusCode;
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use serde_json::{json, Value};

use awesome_snippets::config::Config;
use awesome_snippets::core::helpers::now_epoch;
use awesome_snippets::models::models::{SessionUser, TokenPair};
use awesome_snippets::AppState;

/// One request seen by the mock backend.
#[derive(Debug, Clone)]
pub struct Hit {
    pub method: String,
    pub path: String,
    pub query: String,
    pub authorization: Option<String>,
    pub body: String,
}

#[derive(Clone)]
struct Reply {
    status: u16,
    body: Value,
    delay: Option<Duration>,
}

#[derive(Default)]
struct MockState {
    routes: HashMap<(String, String), Reply>,
    hits: Vec<Hit>,
}

/// In-process stand-in for the REST backend, listening on an ephemeral port.
/// Unregistered routes answer 404 with a DRF style `detail` body.
pub struct MockBackend {
    pub url: String,
    state: Arc<Mutex<MockState>>,
    handle: ServerHandle,
}

async fn respond(req: HttpRequest, body: web::Bytes, state: web::Data<Mutex<MockState>>) -> HttpResponse {
    let key = (req.method().to_string(), req.path().to_string());
    let reply = {
        let mut state = state.lock().unwrap();
        state.hits.push(Hit {
            method: key.0.clone(),
            path: key.1.clone(),
            query: req.query_string().to_string(),
            authorization: req
                .headers()
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
            body: String::from_utf8_lossy(&body).into_owned(),
        });
        state.routes.get(&key).cloned()
    };

    match reply {
        Some(reply) => {
            if let Some(delay) = reply.delay {
                actix_web::rt::time::sleep(delay).await;
            }
            HttpResponse::build(StatusCode::from_u16(reply.status).unwrap()).json(reply.body)
        }
        None => HttpResponse::NotFound().json(json!({"detail": "Not found."})),
    }
}

impl MockBackend {
    pub async fn start() -> Self {
        let state = Arc::new(Mutex::new(MockState::default()));
        let data = web::Data::from(state.clone());
        let server = HttpServer::new(move || App::new().app_data(data.clone()).default_service(web::to(respond)))
            .workers(1)
            .bind(("127.0.0.1", 0))
            .expect("Failed to bind mock backend");
        let addr = server.addrs()[0];
        let server = server.run();
        let handle = server.handle();
        actix_web::rt::spawn(server);

        Self {
            url: format!("http://{}/api/", addr),
            state,
            handle,
        }
    }

    /// Registers a reply for `method` on `path` (relative to `/api/`).
    pub fn on(&self, method: &str, path: &str, status: u16, body: Value) {
        self.on_delayed(method, path, status, body, None);
    }

    pub fn on_delayed(&self, method: &str, path: &str, status: u16, body: Value, delay: Option<Duration>) {
        self.state
            .lock()
            .unwrap()
            .routes
            .insert((method.to_string(), format!("/api/{}", path)), Reply { status, body, delay });
    }

    pub fn hits(&self) -> Vec<Hit> {
        self.state.lock().unwrap().hits.clone()
    }

    pub fn hits_for(&self, method: &str, path: &str) -> Vec<Hit> {
        let full = format!("/api/{}", path);
        self.hits()
            .into_iter()
            .filter(|h| h.method == method && h.path == full)
            .collect()
    }

    pub fn clear_hits(&self) {
        self.state.lock().unwrap().hits.clear();
    }

    pub async fn stop(self) {
        self.handle.stop(false).await;
    }
}

pub fn config_for(mock: &MockBackend) -> Config {
    Config::with_backend_url(&mock.url)
}

pub fn state_for(config: Config) -> web::Data<AppState> {
    web::Data::new(AppState::new(config).expect("Failed to build app state"))
}

pub fn token_pair(access: &str, username: &str) -> TokenPair {
    TokenPair {
        access: access.to_string(),
        refresh: format!("refresh-{}", access),
        user: Some(SessionUser {
            id: Some(1),
            username: username.to_string(),
            email: Some(format!("{}@example.com", username)),
        }),
    }
}

/// Opens a session whose access token was issued `age_secs` ago and returns
/// its cookie.
pub fn login_cookie(state: &AppState, username: &str, age_secs: i64) -> Cookie<'static> {
    let session = state
        .sessions
        .start(token_pair("access-1", username), now_epoch() - age_secs);
    Cookie::new("acs_session", session.id)
}

pub fn snippet_json(id: i64, title: &str, language: &str, author: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "description": format!("About {}", title),
        "code": "fn main() {}",
        "language": language,
        "coder": {"id": 1, "username": author},
        "publication_date": "2024-04-12T08:15:00Z",
        "updated_date": "2024-04-12T08:15:00Z",
        "tags": ["demo"],
        "bookmarked": false
    })
}

pub fn language_choices_json() -> Value {
    json!({
        "languages": [
            {"key": "rust", "value": "Rust"},
            {"key": "python", "value": "Python"}
        ],
        "style_choices": [
            {"key": "monokai", "value": "Monokai"}
        ]
    })
}
