//! Thin typed wrapper over the backend REST API.
//!
//! Every data-fetching call in the app goes through one [`ApiClient`], which
//! owns a single configured `reqwest::Client`. Authenticated calls take the
//! access token explicitly; the session layer decides which token to pass.

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::config::Config;
use crate::core::errors::{backend_error_message, UNREACHABLE_BACKEND};
use crate::models::models::{
    BookmarkStatus, Comment, Contributor, Credentials, LanguageChoices, LanguageSummary, Listing, NewComment,
    NewSnippet, PagedResponse, RefreshResponse, Registration, Snippet, SnippetUpdate, TokenPair,
};

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("backend answered {status}: {body}")]
    Status { status: u16, body: Value },

    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Message suitable for a toast or an inline form error.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Status { body, .. } => backend_error_message(body),
            ClientError::Transport(_) | ClientError::Decode(_) => UNREACHABLE_BACKEND.to_string(),
        }
    }
}

/// Filters for the paginated snippet listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnippetQuery {
    pub page: usize,
    pub page_size: usize,
    pub language: Option<String>,
    pub search: Option<String>,
}

impl SnippetQuery {
    fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("page", self.page.max(1).to_string())];
        if self.page_size > 0 {
            pairs.push(("page_size", self.page_size.to_string()));
        }
        if let Some(language) = self.language.as_ref().filter(|l| !l.is_empty() && *l != "all") {
            pairs.push(("language", language.clone()));
        }
        if let Some(search) = self.search.as_ref().filter(|s| !s.is_empty()) {
            pairs.push(("search", search.clone()));
        }
        pairs
    }
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: config.backend_url.clone(),
        })
    }

    fn request(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path.trim_start_matches('/'));
        let builder = self
            .http
            .request(method, url)
            .header(reqwest::header::ACCEPT, "application/json");
        match token {
            Some(token) if !token.is_empty() => builder.bearer_auth(token),
            _ => builder,
        }
    }

    async fn send(builder: RequestBuilder) -> Result<reqwest::Response, ClientError> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let text = response.text().await.unwrap_or_default();
        let body = serde_json::from_str::<Value>(&text).unwrap_or(Value::String(text));
        log::debug!("backend error {}: {}", status, body);
        Err(ClientError::Status { status: status.as_u16(), body })
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()))
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        token: Option<&str>,
    ) -> Result<T, ClientError> {
        let response = Self::send(self.request(Method::GET, path, token).query(query)).await?;
        Self::decode(response).await
    }

    async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        token: Option<&str>,
    ) -> Result<(StatusCode, T), ClientError> {
        let response = Self::send(self.request(method, path, token).json(body)).await?;
        let status = response.status();
        Ok((status, Self::decode(response).await?))
    }

    // === Authentication ===

    pub async fn obtain_token(&self, credentials: &Credentials) -> Result<TokenPair, ClientError> {
        let (_, pair) = self.send_json(Method::POST, "auth/token/", credentials, None).await?;
        Ok(pair)
    }

    pub async fn refresh_token(&self, refresh: &str) -> Result<RefreshResponse, ClientError> {
        let body = serde_json::json!({ "refresh": refresh });
        let (_, fresh) = self.send_json(Method::POST, "auth/token/refresh/", &body, None).await?;
        Ok(fresh)
    }

    pub async fn register(&self, registration: &Registration) -> Result<TokenPair, ClientError> {
        let (_, pair) = self.send_json(Method::POST, "auth/register/", registration, None).await?;
        Ok(pair)
    }

    // === Snippets ===

    pub async fn list_snippets(
        &self,
        query: &SnippetQuery,
        token: Option<&str>,
    ) -> Result<PagedResponse<Snippet>, ClientError> {
        let listing: Listing<Snippet> = self.get("snippets/", &query.pairs(), token).await?;
        Ok(listing.into_page())
    }

    pub async fn get_snippet(&self, id: i64, token: Option<&str>) -> Result<Snippet, ClientError> {
        self.get(&format!("snippets/{}/", id), &[], token).await
    }

    pub async fn create_snippet(&self, snippet: &NewSnippet, token: &str) -> Result<Snippet, ClientError> {
        let (_, created) = self.send_json(Method::POST, "snippets/", snippet, Some(token)).await?;
        Ok(created)
    }

    pub async fn update_snippet(&self, id: i64, update: &SnippetUpdate, token: &str) -> Result<Snippet, ClientError> {
        let (_, updated) = self
            .send_json(Method::PATCH, &format!("snippets/{}/", id), update, Some(token))
            .await?;
        Ok(updated)
    }

    pub async fn delete_snippet(&self, id: i64, token: &str) -> Result<(), ClientError> {
        Self::send(self.request(Method::DELETE, &format!("snippets/{}/", id), Some(token))).await?;
        Ok(())
    }

    pub async fn toggle_bookmark(&self, id: i64, token: &str) -> Result<BookmarkStatus, ClientError> {
        let (_, status) = self
            .send_json(Method::POST, &format!("snippets/{}/bookmark/", id), &serde_json::json!({}), Some(token))
            .await?;
        Ok(status)
    }

    pub async fn language_options(&self) -> Result<LanguageChoices, ClientError> {
        self.get("snippets/languages/", &[], None).await
    }

    // === Comments ===

    pub async fn list_comments(&self, snippet_id: i64, token: Option<&str>) -> Result<Vec<Comment>, ClientError> {
        let listing: Listing<Comment> = self
            .get("comments/", &[("snippet", snippet_id.to_string())], token)
            .await?;
        Ok(listing.into_page().results)
    }

    /// Posts a comment; returns the status code so callers can insist on 201.
    pub async fn add_comment(&self, comment: &NewComment, token: &str) -> Result<StatusCode, ClientError> {
        let response = Self::send(self.request(Method::POST, "comments/", Some(token)).json(comment)).await?;
        Ok(response.status())
    }

    // === Community statistics ===

    pub async fn language_stats(&self) -> Result<Vec<LanguageSummary>, ClientError> {
        let listing: Listing<LanguageSummary> = self.get("languages/stats/", &[], None).await?;
        Ok(listing.into_page().results)
    }

    pub async fn top_contributors(&self) -> Result<Vec<Contributor>, ClientError> {
        let listing: Listing<Contributor> = self.get("contributors/top/", &[], None).await?;
        Ok(listing.into_page().results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snippet_query_skips_all_and_blank_filters() {
        let query = SnippetQuery {
            page: 0,
            page_size: 4,
            language: Some("all".into()),
            search: Some(String::new()),
        };
        assert_eq!(query.pairs(), vec![("page", "1".to_string()), ("page_size", "4".to_string())]);

        let query = SnippetQuery {
            page: 2,
            page_size: 0,
            language: Some("rust".into()),
            search: Some("sort".into()),
        };
        assert_eq!(
            query.pairs(),
            vec![
                ("page", "2".to_string()),
                ("language", "rust".to_string()),
                ("search", "sort".to_string())
            ]
        );
    }

    #[test]
    fn user_message_prefers_backend_payload() {
        let err = ClientError::Status {
            status: 401,
            body: serde_json::json!({"detail": "No active account found with the given credentials"}),
        };
        assert_eq!(err.user_message(), "Invalid username or password.");
        assert_eq!(ClientError::Decode("eof".into()).user_message(), UNREACHABLE_BACKEND);
    }
}
