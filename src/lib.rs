use actix_web::web;

pub mod auth;
pub mod client;
pub mod community;
pub mod config;
pub mod core;
pub mod loaders;
pub mod models;
pub mod session;
pub mod snippets;
pub mod static_server;
pub mod templates;
pub mod ui;

use client::{ApiClient, ClientError};
use config::Config;
use session::SessionStore;

// === Shared state ===
pub struct AppState {
    pub config: Config,
    pub api: ApiClient,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, ClientError> {
        let api = ApiClient::new(&config)?;
        let sessions = SessionStore::new(config.access_token_lifetime_secs, config.refresh_token_lifetime_secs);
        Ok(Self { config, api, sessions })
    }
}

// === Routes ===
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(community::overview))
        .route("/snippets", web::get().to(snippets::list_snippets))
        .route("/snippet-detail/{id}", web::get().to(snippets::snippet_detail))
        .route("/snippet-detail/{id}/download", web::get().to(snippets::download_snippet))
        .route("/snippet-detail/{id}/bookmark", web::post().to(snippets::toggle_bookmark))
        .route("/snippet-detail/{id}/comments", web::post().to(snippets::add_comment))
        .route("/snippet-detail/{id}/delete", web::post().to(snippets::delete_snippet))
        .route("/add-snippet", web::get().to(snippets::new_snippet_form))
        .route("/add-snippet", web::post().to(snippets::create_snippet))
        .route("/edit-snippet/{id}", web::get().to(snippets::edit_snippet_form))
        .route("/edit-snippet/{id}", web::post().to(snippets::update_snippet))
        .route("/contributors", web::get().to(community::contributors))
        .route("/languages", web::get().to(community::languages))
        .route("/profile", web::get().to(auth::profile))
        .route("/auth/login", web::post().to(auth::login))
        .route("/auth/register", web::post().to(auth::register))
        .route("/auth/logout", web::post().to(auth::logout))
        .route("/theme", web::post().to(ui::toggle_theme))
        .route("/static/{path:.*}", web::get().to(static_server::serve_static));
}
