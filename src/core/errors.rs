use actix_web::http::header::ContentType;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::Value;
use thiserror::Error;

use crate::client::ClientError;

pub const GENERIC_ERROR: &str = "An unexpected error occurred. Please try again later.";
pub const UNREACHABLE_BACKEND: &str = "We couldn’t complete your request. Please try again later.";
pub const SESSION_EXPIRED: &str = "Your session has expired. Please log in again.";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Backend error: {0}")]
    Backend(#[from] ClientError),

    #[error("Internal Error: {0}")]
    InternalError(String),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Backend(_) => StatusCode::BAD_GATEWAY,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            AppError::Backend(err) => err.user_message(),
            AppError::InternalError(_) => GENERIC_ERROR.to_string(),
            other => other.to_string(),
        };
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("{}", self);
        }
        HttpResponse::build(status)
            .insert_header(ContentType::html())
            .body(format!(
                "<!doctype html><html><head><title>{code}</title><link rel=\"stylesheet\" href=\"/static/app.css\"></head>\
                 <body><main class=\"container\"><h1>{code}</h1><p>{message}</p><a href=\"/\">← Back to Home</a></main></body></html>",
                code = status.as_u16(),
                message = html_escape::encode_text(&message),
            ))
    }
}

/// Turns an error payload from the backend into a message fit for a toast.
///
/// Understands the `detail` shape used by token and permission errors, a
/// plain `message` string, and field validation objects (first field wins).
pub fn backend_error_message(body: &Value) -> String {
    if let Some(detail) = body.get("detail") {
        let detail = match detail {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        return detail_message(&detail);
    }

    if let Some(Value::String(message)) = body.get("message") {
        if !message.is_empty() {
            return message.clone();
        }
    }

    match body {
        Value::Object(fields) => fields
            .values()
            .next()
            .map(field_errors)
            .filter(|msg| !msg.is_empty())
            .unwrap_or_else(|| GENERIC_ERROR.to_string()),
        Value::String(s) if !s.is_empty() => s.clone(),
        _ => GENERIC_ERROR.to_string(),
    }
}

fn detail_message(detail: &str) -> String {
    let lower = detail.to_lowercase();
    if lower.contains("no active account") {
        "Invalid username or password.".to_string()
    } else if lower.contains("token is invalid") || lower.contains("token has expired") {
        SESSION_EXPIRED.to_string()
    } else if lower.contains("not authenticated") {
        "You must be logged in to access this resource.".to_string()
    } else if lower.contains("invalid token") {
        "Authentication failed. Please log in again.".to_string()
    } else if lower.contains("user is inactive") {
        "Your account is inactive. Please contact support.".to_string()
    } else {
        detail.to_string()
    }
}

fn field_errors(value: &Value) -> String {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join("\n"),
        Value::String(s) => s.clone(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn maps_known_detail_messages() {
        let body = json!({"detail": "No active account found with the given credentials"});
        assert_eq!(backend_error_message(&body), "Invalid username or password.");

        let body = json!({"detail": "Given token not valid for any token type", "code": "token_not_valid"});
        assert_eq!(backend_error_message(&body), "Given token not valid for any token type");

        let body = json!({"detail": "Token is invalid or expired"});
        assert_eq!(backend_error_message(&body), SESSION_EXPIRED);

        let body = json!({"detail": "Authentication credentials were not provided. Not authenticated"});
        assert_eq!(backend_error_message(&body), "You must be logged in to access this resource.");
    }

    #[test]
    fn first_validation_error_wins() {
        let body: Value = serde_json::from_str(
            r#"{"username": ["A user with that username already exists.", "Too short."],
                "email": ["Enter a valid email address."]}"#,
        )
        .unwrap();
        assert_eq!(
            backend_error_message(&body),
            "A user with that username already exists.\nToo short."
        );

        let body = json!({"password": ["This password is too common."], "email": ["Enter a valid email address."]});
        assert_eq!(backend_error_message(&body), "This password is too common.");
    }

    #[test]
    fn message_field_and_fallback() {
        assert_eq!(backend_error_message(&json!({"message": "Nope"})), "Nope");
        assert_eq!(backend_error_message(&json!({})), GENERIC_ERROR);
        assert_eq!(backend_error_message(&Value::Null), GENERIC_ERROR);
    }
}
