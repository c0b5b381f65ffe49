use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Coder {
    pub id: i64,
    pub username: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Snippet {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub highlighted_code: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub coder: Option<Coder>,
    #[serde(default)]
    pub publication_date: Option<String>,
    #[serde(default)]
    pub updated_date: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub bookmarked: bool,
}

impl Snippet {
    pub fn author(&self) -> Option<&str> {
        self.coder.as_ref().map(|c| c.username.as_str())
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct CommentUser {
    pub id: i64,
    pub username: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Comment {
    pub id: i64,
    pub snippet: i64,
    pub user: CommentUser,
    pub detail: String,
    #[serde(default)]
    pub date_commented: Option<String>,
    #[serde(default)]
    pub parent: Option<i64>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Contributor {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub last_login: Option<String>,
    #[serde(default)]
    pub date_joined: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_snippets: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub top_languages: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct RecentSnippet {
    pub id: i64,
    pub title: String,
    #[serde(default, rename = "coder__username")]
    pub coder_username: Option<String>,
    #[serde(default)]
    pub updated_date: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct LanguageContributor {
    #[serde(alias = "coder__username")]
    pub username: String,
    #[serde(default, alias = "total")]
    pub total_snippets: u64,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct LanguageSummary {
    pub language: String,
    #[serde(default)]
    pub total_snippets: u64,
    #[serde(default)]
    pub total_contributors: u64,
    #[serde(default)]
    pub percentage: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub recent_snippets: Vec<RecentSnippet>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub top_contributors: Vec<LanguageContributor>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct LanguageOption {
    pub key: String,
    pub value: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct LanguageChoices {
    #[serde(default)]
    pub languages: Vec<LanguageOption>,
    #[serde(default)]
    pub style_choices: Vec<LanguageOption>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PagedResponse<T> {
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Default for PagedResponse<T> {
    fn default() -> Self {
        Self { count: Some(0), next: None, previous: None, results: Vec::new() }
    }
}

impl<T> PagedResponse<T> {
    pub fn total(&self) -> u64 {
        self.count.unwrap_or(self.results.len() as u64)
    }
}

/// List endpoints answer either with a page envelope or a bare array.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub enum Listing<T> {
    Paged(PagedResponse<T>),
    Plain(Vec<T>),
}

impl<T> Listing<T> {
    pub fn into_page(self) -> PagedResponse<T> {
        match self {
            Listing::Paged(page) => page,
            Listing::Plain(results) => PagedResponse {
                count: Some(results.len() as u64),
                next: None,
                previous: None,
                results,
            },
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct SessionUser {
    #[serde(default, alias = "pk")]
    pub id: Option<i64>,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
    #[serde(default)]
    pub user: Option<SessionUser>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct RefreshResponse {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct BookmarkStatus {
    pub status: String,
}

impl BookmarkStatus {
    pub fn is_bookmarked(&self) -> bool {
        self.status == "bookmark added"
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct NewSnippet {
    pub title: String,
    pub language: String,
    pub description: String,
    pub code: String,
    pub tags: Vec<String>,
    pub style: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SnippetUpdate {
    pub title: String,
    pub language: String,
    pub description: String,
    pub code: String,
    pub tags: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct NewComment {
    pub snippet: i64,
    pub detail: String,
}

#[derive(Serialize, Clone, Debug)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, Clone, Debug)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password2: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snippet_tolerates_missing_and_null_fields() {
        let snippet: Snippet = serde_json::from_str(
            r#"{"id": 3, "title": "Quick sort", "tags": null, "bookmarked": null, "coder": {"id": 1, "username": "ana"}}"#,
        )
        .unwrap();
        assert!(snippet.tags.is_empty());
        assert!(!snippet.bookmarked);
        assert_eq!(snippet.author(), Some("ana"));
        assert!(snippet.code.is_none());
    }

    #[test]
    fn listing_accepts_bare_arrays_and_pages() {
        let plain: Listing<Coder> = serde_json::from_str(r#"[{"id": 1, "username": "a"}]"#).unwrap();
        assert_eq!(plain.into_page().total(), 1);

        let paged: Listing<Coder> =
            serde_json::from_str(r#"{"count": 12, "next": null, "previous": null, "results": []}"#).unwrap();
        assert_eq!(paged.into_page().total(), 12);
    }

    #[test]
    fn session_user_accepts_pk() {
        let user: SessionUser = serde_json::from_str(r#"{"pk": 7, "username": "neo"}"#).unwrap();
        assert_eq!(user.id, Some(7));
    }

    #[test]
    fn bookmark_status_matches_exact_string() {
        assert!(BookmarkStatus { status: "bookmark added".into() }.is_bookmarked());
        assert!(!BookmarkStatus { status: "bookmark removed".into() }.is_bookmarked());
    }
}
