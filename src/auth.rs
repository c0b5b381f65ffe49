use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;

use crate::config::SESSION_COOKIE;
use crate::core::errors::AppError;
use crate::core::helpers::{initial, now_epoch};
use crate::core::query_params::{link_with, parse_query_params};
use crate::models::models::{Credentials, Registration, SessionUser, TokenPair};
use crate::templates::{self, text};
use crate::ui::{flash_cookie, removal_cookie, safe_next, session_cookie, NavPage, PageContext, Toast, ToastKind};
use crate::AppState;

pub const PASSWORD_MISMATCH: &str = "The passwords you entered don’t match.";

#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub next: Option<String>,
}

#[derive(Deserialize)]
pub struct RegisterForm {
    pub username: String,
    #[serde(default)]
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub next: Option<String>,
}

#[derive(Deserialize)]
pub struct LogoutForm {
    pub next: Option<String>,
}

/// `next` with the login modal reopened, for showing an error inside it.
fn modal_target(next: &str) -> String {
    let path = next.split('?').next().unwrap_or(next);
    link_with(path, &parse_query_params(next), &[], &[("show_login_modal", "true")])
}

fn auth_failure(next: &str, kind: ToastKind, message: impl Into<String>) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, modal_target(next)))
        .cookie(flash_cookie(&Toast::with_kind(kind, message)))
        .finish()
}

fn open_session(state: &AppState, mut pair: TokenPair, fallback_username: &str, next: &str, toast: Toast) -> HttpResponse {
    if pair.user.as_ref().map_or(true, |u| u.username.is_empty()) {
        pair.user = Some(SessionUser {
            username: fallback_username.to_string(),
            ..pair.user.unwrap_or_default()
        });
    }
    let session = state.sessions.start(pair, now_epoch());
    log::info!("user {} signed in", session.username());
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, next.to_string()))
        .cookie(session_cookie(&session.id, &state.config))
        .cookie(flash_cookie(&toast))
        .finish()
}

pub async fn login(state: web::Data<AppState>, form: web::Form<LoginForm>) -> HttpResponse {
    let form = form.into_inner();
    let next = safe_next(form.next.as_deref());
    let credentials = Credentials {
        username: form.username.trim().to_string(),
        password: form.password,
    };

    match state.api.obtain_token(&credentials).await {
        Ok(pair) => open_session(&state, pair, &credentials.username, &next, Toast::success("Successfully logged in!")),
        Err(err) => {
            log::info!("login failed for {}: {}", credentials.username, err);
            auth_failure(&next, ToastKind::LoginError, err.user_message())
        }
    }
}

pub async fn register(state: web::Data<AppState>, form: web::Form<RegisterForm>) -> HttpResponse {
    let form = form.into_inner();
    let next = safe_next(form.next.as_deref());
    if form.password != form.confirm_password {
        return auth_failure(&next, ToastKind::SignupError, PASSWORD_MISMATCH);
    }

    let registration = Registration {
        username: form.username.trim().to_string(),
        email: form.email.trim().to_string(),
        password: form.password,
        password2: form.confirm_password,
    };
    match state.api.register(&registration).await {
        Ok(pair) => open_session(&state, pair, &registration.username, &next, Toast::success("Account created successfully!")),
        Err(err) => {
            log::info!("registration failed for {}: {}", registration.username, err);
            auth_failure(&next, ToastKind::SignupError, err.user_message())
        }
    }
}

pub async fn logout(req: HttpRequest, state: web::Data<AppState>, form: web::Form<LogoutForm>) -> HttpResponse {
    if let Some(cookie) = req.cookie(SESSION_COOKIE) {
        if state.sessions.end(cookie.value()) {
            log::info!("session {} signed out", cookie.value());
        }
    }
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, safe_next(form.next.as_deref())))
        .cookie(removal_cookie(SESSION_COOKIE))
        .cookie(flash_cookie(&Toast::info("You have been signed out.")))
        .finish()
}

pub async fn profile(req: HttpRequest, state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let ctx = PageContext::load(&req, &state, NavPage::Profile).await;
    let Some(session) = ctx.session.as_ref() else {
        return Ok(ctx.login_redirect("/"));
    };

    let expires = chrono::DateTime::from_timestamp(session.expires_at, 0)
        .map(|dt| dt.format("%b %-d, %Y %H:%M UTC").to_string())
        .unwrap_or_default();
    let body = templates::render(
        "profile.html",
        &[
            ("username", text(session.username())),
            ("initial", text(&initial(session.username()))),
            ("email", text(session.user.email.as_deref().unwrap_or("Not provided"))),
            ("expires", expires),
        ],
    )?;
    templates::page(&ctx, "Profile", body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modal_target_keeps_existing_query() {
        assert_eq!(modal_target("/"), "/?show_login_modal=true");
        assert_eq!(
            modal_target("/snippets?language=rust"),
            "/snippets?language=rust&show_login_modal=true"
        );
    }
}
