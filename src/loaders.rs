//! Per-route data loaders.
//!
//! Each loader issues its backend calls independently and swaps any failure
//! for an empty default so the page still renders. Failures are logged, never
//! retried.

use crate::client::{ApiClient, ClientError, SnippetQuery};
use crate::config::{OVERVIEW_LIST_LENGTH, RELATED_SNIPPETS_LENGTH};
use crate::models::models::{
    Comment, Contributor, LanguageChoices, LanguageSummary, PagedResponse, Snippet,
};

fn or_default<T: Default>(what: &str, result: Result<T, ClientError>) -> T {
    result.unwrap_or_else(|err| {
        log::warn!("failed to load {}: {}", what, err);
        T::default()
    })
}

pub struct OverviewData {
    pub top_languages: Vec<LanguageSummary>,
    pub top_contributors: Vec<Contributor>,
    pub latest_snippets: Vec<Snippet>,
}

pub async fn load_overview(api: &ApiClient) -> OverviewData {
    let latest = SnippetQuery {
        page: 1,
        page_size: OVERVIEW_LIST_LENGTH,
        ..Default::default()
    };
    let (languages, contributors, snippets) = tokio::join!(
        api.language_stats(),
        api.top_contributors(),
        api.list_snippets(&latest, None),
    );

    let mut top_languages = or_default("language stats", languages);
    top_languages.truncate(OVERVIEW_LIST_LENGTH);
    let mut top_contributors = or_default("top contributors", contributors);
    top_contributors.truncate(OVERVIEW_LIST_LENGTH);
    let mut latest_snippets = or_default("latest snippets", snippets).results;
    latest_snippets.truncate(OVERVIEW_LIST_LENGTH);

    OverviewData {
        top_languages,
        top_contributors,
        latest_snippets,
    }
}

pub struct SnippetListData {
    pub page: PagedResponse<Snippet>,
    pub choices: LanguageChoices,
}

pub async fn load_snippet_list(api: &ApiClient, query: &SnippetQuery, token: Option<&str>) -> SnippetListData {
    let (page, choices) = tokio::join!(api.list_snippets(query, token), api.language_options());
    SnippetListData {
        page: or_default("snippets", page),
        choices: or_default("language options", choices),
    }
}

pub struct SnippetDetailData {
    pub snippet: Snippet,
    pub comments: Vec<Comment>,
    pub related: Vec<Snippet>,
}

/// `Ok(None)` when the snippet itself is missing; comments and related
/// snippets fall back to empty lists.
pub async fn load_snippet_detail(
    api: &ApiClient,
    id: i64,
    token: Option<&str>,
) -> Result<Option<SnippetDetailData>, ClientError> {
    let (snippet, comments) = tokio::join!(api.get_snippet(id, token), api.list_comments(id, token));
    let snippet = match snippet {
        Ok(snippet) => snippet,
        Err(err) if err.is_not_found() => return Ok(None),
        Err(err) => return Err(err),
    };

    let related_query = SnippetQuery {
        page: 1,
        page_size: RELATED_SNIPPETS_LENGTH + 1,
        language: snippet.language.clone(),
        search: None,
    };
    let mut related = or_default("related snippets", api.list_snippets(&related_query, token).await).results;
    related.retain(|s| s.id != snippet.id);
    related.truncate(RELATED_SNIPPETS_LENGTH);

    Ok(Some(SnippetDetailData {
        snippet,
        comments: or_default("comments", comments),
        related,
    }))
}

pub async fn load_language_choices(api: &ApiClient) -> LanguageChoices {
    or_default("language options", api.language_options().await)
}

pub struct SnippetEditData {
    pub snippet: Snippet,
    pub choices: LanguageChoices,
}

pub async fn load_snippet_edit(api: &ApiClient, id: i64, token: Option<&str>) -> Result<Option<SnippetEditData>, ClientError> {
    let (snippet, choices) = tokio::join!(api.get_snippet(id, token), api.language_options());
    match snippet {
        Ok(snippet) => Ok(Some(SnippetEditData {
            snippet,
            choices: or_default("language options", choices),
        })),
        Err(err) if err.is_not_found() => Ok(None),
        Err(err) => Err(err),
    }
}

pub async fn load_contributors(api: &ApiClient) -> Vec<Contributor> {
    or_default("contributors", api.top_contributors().await)
}

pub async fn load_language_stats(api: &ApiClient) -> Vec<LanguageSummary> {
    or_default("language stats", api.language_stats().await)
}
