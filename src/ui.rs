use std::collections::HashMap;

use actix_web::cookie::time::Duration as CookieDuration;
use actix_web::cookie::{Cookie, SameSite};
use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse, HttpResponseBuilder};
use serde::Deserialize;

use crate::config::{Config, FLASH_COOKIE, SESSION_COOKIE, THEME_COOKIE};
use crate::core::errors::SESSION_EXPIRED;
use crate::core::query_params::{get_bool_flag, link_with, parse_query_params};
use crate::session::Session;
use crate::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavPage {
    Overview,
    Snippets,
    Contributors,
    Languages,
    SnippetDetail,
    AddSnippet,
    EditSnippet,
    Profile,
}

impl NavPage {
    /// Top-level section highlighted in the header.
    pub fn section(self) -> NavPage {
        match self {
            NavPage::SnippetDetail | NavPage::AddSnippet | NavPage::EditSnippet => NavPage::Snippets,
            other => other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn from_cookie(value: Option<&str>) -> Self {
        match value {
            Some("dark") => Theme::Dark,
            _ => Theme::Light,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
    Info,
    /// Shown inside the login modal rather than as a toast.
    LoginError,
    SignupError,
}

impl ToastKind {
    fn as_str(self) -> &'static str {
        match self {
            ToastKind::Success => "success",
            ToastKind::Error => "error",
            ToastKind::Info => "info",
            ToastKind::LoginError => "login",
            ToastKind::SignupError => "signup",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        Some(match raw {
            "success" => ToastKind::Success,
            "error" => ToastKind::Error,
            "info" => ToastKind::Info,
            "login" => ToastKind::LoginError,
            "signup" => ToastKind::SignupError,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
}

impl Toast {
    pub fn success(message: impl Into<String>) -> Self {
        Self { kind: ToastKind::Success, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { kind: ToastKind::Error, message: message.into() }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self { kind: ToastKind::Info, message: message.into() }
    }

    pub fn with_kind(kind: ToastKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }

    pub fn kind_name(&self) -> &'static str {
        self.kind.as_str()
    }

    pub fn encode(&self) -> String {
        urlencoding::encode(&format!("{}:{}", self.kind.as_str(), self.message)).into_owned()
    }

    pub fn decode(raw: &str) -> Option<Self> {
        let decoded = urlencoding::decode(raw).ok()?;
        let (kind, message) = decoded.split_once(':')?;
        Some(Self {
            kind: ToastKind::parse(kind)?,
            message: message.to_string(),
        })
    }
}

/// Everything a page needs besides its own data: who is logged in, which
/// theme is active, the pending toast and whether the login modal is open.
pub struct PageContext {
    pub path: String,
    pub params: HashMap<String, String>,
    pub nav: NavPage,
    pub session: Option<Session>,
    pub theme: Theme,
    pub toast: Option<Toast>,
    pub show_login_modal: bool,
    consumed_flash: bool,
    clear_session: bool,
}

impl PageContext {
    pub async fn load(req: &HttpRequest, state: &AppState, nav: NavPage) -> Self {
        let params = parse_query_params(&req.uri().to_string());
        let theme = Theme::from_cookie(req.cookie(THEME_COOKIE).as_ref().map(|c| c.value()));
        let flash = req.cookie(FLASH_COOKIE);
        let mut toast = flash.as_ref().and_then(|c| Toast::decode(c.value()));

        let mut clear_session = false;
        let session = match req.cookie(SESSION_COOKIE) {
            Some(cookie) => match state.sessions.read(cookie.value(), &state.api).await {
                Ok(Some(session)) => Some(session),
                Ok(None) => {
                    clear_session = true;
                    None
                }
                Err(err) => {
                    log::info!("session dropped: {}", err);
                    clear_session = true;
                    toast = Some(Toast::error(SESSION_EXPIRED));
                    None
                }
            },
            None => None,
        };

        Self {
            path: req.path().to_string(),
            show_login_modal: get_bool_flag(&params, "show_login_modal"),
            params,
            nav,
            session,
            theme,
            toast,
            consumed_flash: flash.is_some(),
            clear_session,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    pub fn username(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.username())
    }

    pub fn access_token(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.access_token.as_str())
    }

    /// The current page without the login modal flag; used as a return target.
    pub fn current_url(&self) -> String {
        link_with(&self.path, &self.params, &["show_login_modal"], &[])
    }

    pub fn login_url(&self) -> String {
        link_with(&self.path, &self.params, &[], &[("show_login_modal", "true")])
    }

    /// Takes the pending toast if it belongs inside the login modal.
    pub fn auth_error(&self, kind: ToastKind) -> Option<&str> {
        self.toast
            .as_ref()
            .filter(|t| t.kind == kind)
            .map(|t| t.message.as_str())
    }

    pub fn set_toast(&mut self, toast: Toast) {
        self.toast = Some(toast);
    }

    /// Expires the one-shot cookies this request consumed.
    pub fn apply_cookies(&self, builder: &mut HttpResponseBuilder) {
        if self.consumed_flash {
            builder.cookie(removal_cookie(FLASH_COOKIE));
        }
        if self.clear_session {
            builder.cookie(removal_cookie(SESSION_COOKIE));
        }
    }

    /// The expiry notice raised while loading this request, if any.
    fn expired_toast(&self) -> Option<&Toast> {
        self.toast
            .as_ref()
            .filter(|t| self.clear_session && t.message == SESSION_EXPIRED)
    }

    /// Redirects with a flash toast. A session that expired on this request
    /// reports that instead and has its cookie cleared.
    pub fn redirect_with_toast(&self, location: &str, toast: &Toast) -> HttpResponse {
        let mut builder = HttpResponse::SeeOther();
        builder
            .insert_header((header::LOCATION, location.to_string()))
            .cookie(flash_cookie(self.expired_toast().unwrap_or(toast)));
        if self.clear_session {
            builder.cookie(removal_cookie(SESSION_COOKIE));
        }
        builder.finish()
    }

    /// Sends a logged-out visitor to `target` with the login modal open.
    pub fn login_redirect(&self, target: &str) -> HttpResponse {
        let location = link_with(target, &HashMap::new(), &[], &[("show_login_modal", "true")]);
        if let Some(expired) = self.expired_toast() {
            return self.redirect_with_toast(&location, expired);
        }
        let mut builder = HttpResponse::SeeOther();
        builder.insert_header((header::LOCATION, location));
        self.apply_cookies(&mut builder);
        builder.finish()
    }
}

pub fn session_cookie(id: &str, config: &Config) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, id.to_string())
        .path("/")
        .http_only(true)
        .secure(config.secure_cookies)
        .same_site(SameSite::Lax)
        .max_age(CookieDuration::seconds(config.refresh_token_lifetime_secs))
        .finish()
}

pub fn flash_cookie(toast: &Toast) -> Cookie<'static> {
    Cookie::build(FLASH_COOKIE, toast.encode())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .finish()
}

pub fn theme_cookie(theme: Theme) -> Cookie<'static> {
    Cookie::build(THEME_COOKIE, theme.as_str())
        .path("/")
        .same_site(SameSite::Lax)
        .max_age(CookieDuration::days(365))
        .finish()
}

pub fn removal_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build(name, "")
        .path("/")
        .max_age(CookieDuration::ZERO)
        .finish()
}

/// Only same-site absolute paths are accepted as redirect targets.
pub fn safe_next(next: Option<&str>) -> String {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => path.to_string(),
        _ => "/".to_string(),
    }
}

pub fn redirect(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location.to_string()))
        .finish()
}

pub fn redirect_with_toast(location: &str, toast: &Toast) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location.to_string()))
        .cookie(flash_cookie(toast))
        .finish()
}

#[derive(Deserialize)]
pub struct ThemeForm {
    pub next: Option<String>,
}

pub async fn toggle_theme(req: HttpRequest, form: web::Form<ThemeForm>) -> HttpResponse {
    let current = Theme::from_cookie(req.cookie(THEME_COOKIE).as_ref().map(|c| c.value()));
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, safe_next(form.next.as_deref())))
        .cookie(theme_cookie(current.toggled()))
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toast_survives_cookie_encoding() {
        let toast = Toast::with_kind(ToastKind::LoginError, "Invalid username or password.");
        let encoded = toast.encode();
        assert!(!encoded.contains(' '));
        assert_eq!(Toast::decode(&encoded), Some(toast));
        assert_eq!(Toast::decode("bogus"), None);
    }

    #[test]
    fn next_must_be_local() {
        assert_eq!(safe_next(Some("/snippets?page=2")), "/snippets?page=2");
        assert_eq!(safe_next(Some("//evil.example")), "/");
        assert_eq!(safe_next(Some("https://evil.example")), "/");
        assert_eq!(safe_next(None), "/");
    }

    #[test]
    fn theme_toggles() {
        assert_eq!(Theme::from_cookie(Some("dark")).toggled(), Theme::Light);
        assert_eq!(Theme::from_cookie(None), Theme::Light);
    }
}
