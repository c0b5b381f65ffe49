use std::str::FromStr;
use std::time::Duration;

pub const SESSION_COOKIE: &str = "acs_session";
pub const THEME_COOKIE: &str = "theme";
pub const FLASH_COOKIE: &str = "acs_flash";

// Both lifetimes sit a little under the backend's real token lifetimes.
pub const DEFAULT_ACCESS_TOKEN_LIFETIME_SECS: i64 = 45 * 60;
pub const DEFAULT_REFRESH_TOKEN_LIFETIME_SECS: i64 = 6 * 24 * 60 * 60;

pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8000/api/";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_ITEMS_PER_PAGE: usize = 10;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

pub const CONTRIBUTORS_PER_PAGE: usize = 6;
pub const OVERVIEW_LIST_LENGTH: usize = 5;
pub const RELATED_SNIPPETS_LENGTH: usize = 4;
pub const DEFAULT_STYLE: &str = "abap";

#[derive(Clone, Debug)]
pub struct Config {
    pub backend_url: String,
    pub bind_addr: String,
    pub items_per_page: usize,
    pub access_token_lifetime_secs: i64,
    pub refresh_token_lifetime_secs: i64,
    pub request_timeout: Duration,
    pub secure_cookies: bool,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            backend_url: normalize_base_url(&env_or("ACS_BACKEND_URL", DEFAULT_BACKEND_URL.to_string())),
            bind_addr: env_or("ACS_BIND_ADDR", DEFAULT_BIND_ADDR.to_string()),
            items_per_page: env_or("ACS_ITEMS_PER_PAGE", DEFAULT_ITEMS_PER_PAGE).max(1),
            access_token_lifetime_secs: env_or("ACS_ACCESS_TOKEN_LIFETIME_SECS", DEFAULT_ACCESS_TOKEN_LIFETIME_SECS),
            refresh_token_lifetime_secs: env_or("ACS_REFRESH_TOKEN_LIFETIME_SECS", DEFAULT_REFRESH_TOKEN_LIFETIME_SECS),
            request_timeout: Duration::from_secs(env_or("ACS_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)),
            secure_cookies: env_or("ACS_SECURE_COOKIES", false),
        }
    }

    /// Defaults pointed at an explicit backend, used by tests and embedders.
    pub fn with_backend_url(backend_url: &str) -> Self {
        Self {
            backend_url: normalize_base_url(backend_url),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            items_per_page: DEFAULT_ITEMS_PER_PAGE,
            access_token_lifetime_secs: DEFAULT_ACCESS_TOKEN_LIFETIME_SECS,
            refresh_token_lifetime_secs: DEFAULT_REFRESH_TOKEN_LIFETIME_SECS,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            secure_cookies: false,
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.parse::<T>().unwrap_or_else(|_| {
            log::warn!("Invalid value for {}, using default", key);
            default
        }),
        Err(_) => default,
    }
}

// Endpoint paths are joined onto the base, so it must end with a slash.
fn normalize_base_url(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{}/", url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gets_trailing_slash() {
        assert_eq!(normalize_base_url("http://api.local/v1"), "http://api.local/v1/");
        assert_eq!(normalize_base_url("http://api.local/v1/"), "http://api.local/v1/");
    }

    #[test]
    fn explicit_backend_keeps_default_lifetimes() {
        let config = Config::with_backend_url("http://localhost:9000/api");
        assert_eq!(config.backend_url, "http://localhost:9000/api/");
        assert_eq!(config.access_token_lifetime_secs, 45 * 60);
        assert_eq!(config.items_per_page, DEFAULT_ITEMS_PER_PAGE);
    }
}
