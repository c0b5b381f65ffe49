use std::collections::HashSet;

use actix_web::http::header::{self, ContentDisposition, DispositionParam, DispositionType};
use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse};
use ammonia::Builder;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::client::SnippetQuery;
use crate::config::DEFAULT_STYLE;
use crate::core::errors::AppError;
use crate::core::helpers::{
    download_file_name, initial, parse_tags, short_date, time_ago, twitter_share_url, whatsapp_share_url,
};
use crate::core::query_params::{get_bool_flag, get_int, get_string, Pagination};
use crate::loaders;
use crate::models::models::{
    Comment, LanguageChoices, LanguageOption, NewComment, NewSnippet, Snippet, SnippetUpdate,
};
use crate::templates::{self, attr, notice, pagination_nav, text};
use crate::ui::{redirect, redirect_with_toast, NavPage, PageContext, Toast};
use crate::AppState;

pub const REQUIRED_FIELDS_MESSAGE: &str = "Please fill in all required fields";

// === Forms ===

#[derive(Deserialize, Serialize, Default, Debug, Clone)]
#[serde(default)]
pub struct SnippetForm {
    pub title: String,
    pub language: String,
    pub description: String,
    pub code: String,
    pub tags: String,
    pub style: Option<String>,
}

impl SnippetForm {
    /// Title, language and code must be present before anything is sent.
    pub fn missing_required(&self) -> bool {
        self.title.trim().is_empty() || self.language.trim().is_empty() || self.code.trim().is_empty()
    }

    fn from_snippet(snippet: &Snippet) -> Self {
        Self {
            title: snippet.title.clone(),
            language: snippet.language.clone().unwrap_or_default(),
            description: snippet.description.clone().unwrap_or_default(),
            code: snippet.code.clone().unwrap_or_default(),
            tags: snippet.tags.join(", "),
            style: snippet.style.clone(),
        }
    }

    fn to_new_snippet(&self, choices: &LanguageChoices) -> NewSnippet {
        let style = self
            .style
            .clone()
            .filter(|s| !s.is_empty())
            .or_else(|| choices.style_choices.first().map(|c| c.key.clone()))
            .unwrap_or_else(|| DEFAULT_STYLE.to_string());
        NewSnippet {
            title: self.title.trim().to_string(),
            language: self.language.trim().to_lowercase(),
            description: self.description.trim().to_string(),
            code: self.code.trim().to_string(),
            tags: parse_tags(&self.tags),
            style,
        }
    }

    fn to_update(&self) -> SnippetUpdate {
        SnippetUpdate {
            title: self.title.trim().to_string(),
            language: self.language.trim().to_string(),
            description: self.description.trim().to_string(),
            code: self.code.trim().to_string(),
            tags: parse_tags(&self.tags),
        }
    }
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct CommentForm {
    pub detail: String,
}

// === Rendering helpers ===

fn sanitize_html(html: &str) -> String {
    Builder::default()
        .link_rel(Some("noopener noreferrer"))
        .clean(html)
        .to_string()
}

// Pygments output: keep the span/div/pre structure and its classes.
fn sanitize_highlighted(html: &str) -> String {
    let tags: HashSet<&str> = ["pre", "code", "span", "div", "table", "tbody", "tr", "td"].into_iter().collect();
    Builder::default()
        .tags(tags)
        .add_generic_attributes(["class", "style"])
        .clean(html)
        .to_string()
}

fn render_code(snippet: &Snippet) -> String {
    match snippet.highlighted_code.as_deref().filter(|h| !h.trim().is_empty()) {
        Some(highlighted) => sanitize_highlighted(highlighted),
        None => format!("<pre><code>{}</code></pre>", text(snippet.code.as_deref().unwrap_or_default())),
    }
}

fn tag_badges(tags: &[String]) -> String {
    tags.iter()
        .map(|tag| format!(r#"<span class="badge">#{}</span>"#, text(tag)))
        .collect()
}

fn language_label(snippet: &Snippet) -> String {
    text(snippet.language.as_deref().unwrap_or("unknown"))
}

fn updated_label(snippet: &Snippet) -> String {
    snippet
        .updated_date
        .as_deref()
        .or(snippet.publication_date.as_deref())
        .map(|ts| time_ago(ts, Utc::now()))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "Unknown".to_string())
}

pub fn snippet_card(snippet: &Snippet) -> String {
    format!(
        r#"<a class="card snippet-card" href="/snippet-detail/{id}">
  <h3>{title}</h3>
  <p class="muted">{description}</p>
  <div><span class="badge">{language}</span>{tags}</div>
  <p class="muted">👤 {author} · updated {updated}</p>
</a>"#,
        id = snippet.id,
        title = text(&snippet.title),
        description = text(snippet.description.as_deref().unwrap_or_default()),
        language = language_label(snippet),
        tags = tag_badges(&snippet.tags),
        author = text(snippet.author().unwrap_or("NA")),
        updated = updated_label(snippet),
    )
}

fn language_select_options(choices: &LanguageChoices, selected: &str, include_all: bool) -> String {
    let mut out = String::new();
    if include_all {
        let sel = if selected.is_empty() || selected == "all" { " selected" } else { "" };
        out.push_str(&format!(r#"<option value="all"{}>All Languages</option>"#, sel));
    }
    for option in &choices.languages {
        let sel = if option.key.eq_ignore_ascii_case(selected) { " selected" } else { "" };
        out.push_str(&format!(
            r#"<option value="{}"{}>{}</option>"#,
            attr(&option.key),
            sel,
            text(&option.value)
        ));
    }
    out
}

fn add_snippet_link(ctx: &PageContext) -> String {
    if ctx.is_authenticated() {
        r#"<a class="btn" href="/add-snippet">➕ Add Snippet</a>"#.to_string()
    } else {
        format!(r#"<a class="btn" href="{}">📝 Login to Add Snippet</a>"#, attr(&ctx.login_url()))
    }
}

fn parse_id(raw: &str) -> Result<i64, AppError> {
    raw.parse::<i64>()
        .map_err(|_| AppError::NotFound("Snippet not found".to_string()))
}

fn detail_url(id: i64) -> String {
    format!("/snippet-detail/{}", id)
}

fn is_owner(ctx: &PageContext, snippet: &Snippet) -> bool {
    match (ctx.username(), snippet.author()) {
        (Some(user), Some(author)) => user == author,
        _ => false,
    }
}

fn auth_required(ctx: &PageContext, message: &str) -> Result<HttpResponse, AppError> {
    templates::page_with_status(
        ctx,
        StatusCode::UNAUTHORIZED,
        "Authentication Required",
        notice("🔒", "Authentication Required", message, "/", "← Back to Home"),
    )
}

fn snippet_missing(ctx: &PageContext) -> Result<HttpResponse, AppError> {
    templates::page_with_status(
        ctx,
        StatusCode::NOT_FOUND,
        "Snippet not found",
        notice("🔍", "Snippet not found", "The snippet you are looking for does not exist.", "/snippets", "← Back to Snippets"),
    )
}

fn snippet_unavailable(ctx: &PageContext) -> Result<HttpResponse, AppError> {
    templates::page_with_status(
        ctx,
        StatusCode::BAD_GATEWAY,
        "Snippet unavailable",
        notice("⚠️", "Failed to load snippet", "Please try again in a moment.", "/snippets", "← Back to Snippets"),
    )
}

// === Snippet list ===

pub async fn list_snippets(req: HttpRequest, state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let ctx = PageContext::load(&req, &state, NavPage::Snippets).await;
    let page = get_int(&ctx.params, "page", 1);
    let language = get_string(&ctx.params, "language", None);
    let search = get_string(&ctx.params, "query", None);
    let per_page = state.config.items_per_page;

    let query = SnippetQuery {
        page,
        page_size: per_page,
        language: language.clone(),
        search: search.clone(),
    };
    let data = loaders::load_snippet_list(&state.api, &query, ctx.access_token()).await;
    let total = data.page.total() as usize;
    let pagination = Pagination::new(page, per_page, total);

    let cards = if data.page.results.is_empty() {
        r#"<div class="notice"><span class="notice-icon">🔍</span><p class="muted">No snippets found. Try a different search or language.</p></div>"#.to_string()
    } else {
        format!(
            r#"<div class="grid">{}</div>"#,
            data.page.results.iter().map(snippet_card).collect::<String>()
        )
    };

    let body = templates::render(
        "snippets.html",
        &[
            ("total", total.to_string()),
            ("add_link", add_snippet_link(&ctx)),
            ("query", attr(search.as_deref().unwrap_or_default())),
            ("language_options", language_select_options(&data.choices, language.as_deref().unwrap_or("all"), true)),
            ("cards", cards),
            ("pagination", pagination_nav(&ctx, &pagination)),
        ],
    )?;
    templates::page(&ctx, "Code Snippets", body)
}

// === Snippet detail ===

fn comment_item(comment: &Comment) -> String {
    let posted = comment
        .date_commented
        .as_deref()
        .map(|ts| time_ago(ts, Utc::now()))
        .unwrap_or_default();
    format!(
        r#"<div class="comment">
  <span class="avatar">{initial}</span>
  <strong>{user}</strong> <span class="muted">⏰ posted {posted}</span>
  <p>{detail}</p>
</div>"#,
        initial = text(&initial(&comment.user.username)),
        user = text(&comment.user.username),
        posted = posted,
        detail = text(&comment.detail),
    )
}

fn related_list(related: &[Snippet]) -> String {
    if related.is_empty() {
        return r#"<div class="notice"><span class="notice-icon">🔗</span><p>No related snippets found</p><p class="muted">Check back later for more content!</p></div>"#.to_string();
    }
    let items: String = related
        .iter()
        .map(|s| {
            format!(
                r#"<a class="card" href="/snippet-detail/{}"><h3>{}</h3><span class="badge">{}</span> <span class="muted">👤 {} · 📅 Last updated {}</span></a>"#,
                s.id,
                text(&s.title),
                language_label(s),
                text(s.author().unwrap_or("NA")),
                updated_label(s)
            )
        })
        .collect();
    format!(r#"<div class="grid">{}</div>"#, items)
}

pub async fn snippet_detail(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let ctx = PageContext::load(&req, &state, NavPage::SnippetDetail).await;
    let id = parse_id(&path)?;
    let data = match loaders::load_snippet_detail(&state.api, id, ctx.access_token()).await {
        Ok(Some(data)) => data,
        Ok(None) => return snippet_missing(&ctx),
        Err(err) => {
            log::warn!("failed to load snippet {}: {}", id, err);
            return snippet_unavailable(&ctx);
        }
    };
    let snippet = &data.snippet;
    let owner = is_owner(&ctx, snippet);
    let page_url = {
        let conn = req.connection_info();
        format!("{}://{}{}", conn.scheme(), conn.host(), detail_url(id))
    };

    let comment_form = if ctx.is_authenticated() {
        format!(
            r#"<form method="post" action="/snippet-detail/{}/comments">
  <textarea name="detail" placeholder="Share your thoughts about this snippet..." required></textarea>
  <button class="btn" type="submit">💬 Post Comment</button>
</form>"#,
            id
        )
    } else {
        format!(
            r#"<p class="muted">🔒 Please <a href="{}">login</a> to post comments</p>"#,
            attr(&ctx.login_url())
        )
    };

    let comments = if data.comments.is_empty() {
        r#"<p class="muted">💬 No comments yet. Be the first to share your thoughts!</p>"#.to_string()
    } else {
        data.comments.iter().map(comment_item).collect()
    };

    let bookmark = if ctx.is_authenticated() {
        let (class, label) = if snippet.bookmarked {
            ("btn", "🔖 Bookmarked")
        } else {
            ("btn outline", "🔖 Bookmark")
        };
        format!(
            r#"<form method="post" action="/snippet-detail/{}/bookmark" class="inline"><button class="{}" type="submit" data-bookmarked="{}">{}</button></form>"#,
            id, class, snippet.bookmarked, label
        )
    } else {
        String::new()
    };

    let owner_actions = if owner {
        format!(
            r#"<a class="btn outline" href="/edit-snippet/{id}">✏️ Edit Snippet</a>
<a class="btn danger" href="/snippet-detail/{id}?confirm_delete=true">🗑️ Delete Snippet</a>"#,
            id = id
        )
    } else {
        String::new()
    };

    let delete_modal = if owner && get_bool_flag(&ctx.params, "confirm_delete") {
        delete_confirmation(&snippet.title, &format!("/snippet-detail/{}/delete", id), &detail_url(id))
    } else {
        String::new()
    };

    let body = templates::render(
        "snippet_detail.html",
        &[
            ("title", text(&snippet.title)),
            ("language", language_label(snippet)),
            ("tags", tag_badges(&snippet.tags)),
            ("author", text(snippet.author().unwrap_or("Unknown"))),
            ("updated", updated_label(snippet)),
            ("published", text(&snippet.publication_date.as_deref().map(short_date).unwrap_or_default())),
            ("description", sanitize_html(snippet.description.as_deref().unwrap_or_default())),
            ("download_url", format!("/snippet-detail/{}/download", id)),
            ("code", render_code(snippet)),
            ("related", related_list(&data.related)),
            ("comment_count", data.comments.len().to_string()),
            ("comment_form", comment_form),
            ("comments", comments),
            ("bookmark", bookmark),
            ("owner_actions", owner_actions),
            ("whatsapp_url", attr(&whatsapp_share_url(&snippet.title, &page_url))),
            (
                "twitter_url",
                attr(&twitter_share_url(&snippet.title, snippet.language.as_deref().unwrap_or_default(), &page_url)),
            ),
            ("delete_modal", delete_modal),
        ],
    )?;
    templates::page(&ctx, &snippet.title, body)
}

fn delete_confirmation(title: &str, action: &str, cancel: &str) -> String {
    format!(
        r#"<div class="modal-backdrop">
  <div class="modal" role="alertdialog">
    <h2>Delete Snippet</h2>
    <p>Are you sure you want to delete "{}"? This action cannot be undone.</p>
    <form method="post" action="{}">
      <a class="btn ghost" href="{}">Cancel</a>
      <button class="btn danger" type="submit">Delete</button>
    </form>
  </div>
</div>"#,
        text(title),
        attr(action),
        attr(cancel)
    )
}

pub async fn download_snippet(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let ctx = PageContext::load(&req, &state, NavPage::SnippetDetail).await;
    let id = parse_id(&path)?;
    let snippet = match state.api.get_snippet(id, ctx.access_token()).await {
        Ok(snippet) => snippet,
        Err(err) if err.is_not_found() => return Err(AppError::NotFound("Snippet not found".to_string())),
        Err(err) => return Err(err.into()),
    };
    let file_name = download_file_name(&snippet.title, snippet.language.as_deref());
    Ok(HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, "text/plain; charset=utf-8"))
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(file_name)],
        })
        .body(snippet.code.unwrap_or_default()))
}

// === Snippet actions ===

pub async fn toggle_bookmark(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let ctx = PageContext::load(&req, &state, NavPage::SnippetDetail).await;
    let id = parse_id(&path)?;
    let target = detail_url(id);
    let Some(token) = ctx.access_token() else {
        return Ok(ctx.login_redirect(&target));
    };

    let toast = match state.api.toggle_bookmark(id, token).await {
        Ok(status) if status.is_bookmarked() => Toast::success("Added into your bookmarks !"),
        Ok(_) => Toast::success("Removed from your bookmarks !"),
        Err(err) => {
            log::warn!("bookmark toggle failed for snippet {}: {}", id, err);
            Toast::error(err.user_message())
        }
    };
    Ok(redirect_with_toast(&target, &toast))
}

pub async fn add_comment(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<String>,
    form: web::Form<CommentForm>,
) -> Result<HttpResponse, AppError> {
    let ctx = PageContext::load(&req, &state, NavPage::SnippetDetail).await;
    let id = parse_id(&path)?;
    let target = format!("{}#comments", detail_url(id));
    let Some(token) = ctx.access_token() else {
        return Ok(ctx.redirect_with_toast(&target, &Toast::error("Please login to comment")));
    };

    let detail = form.detail.trim();
    if detail.is_empty() {
        return Ok(redirect(&target));
    }

    let comment = NewComment {
        snippet: id,
        detail: detail.to_string(),
    };
    let toast = match state.api.add_comment(&comment, token).await {
        Ok(status) if status.as_u16() == 201 => Toast::success("Comment added successfully!"),
        Ok(status) => {
            log::warn!("unexpected status {} when commenting on {}", status, id);
            Toast::error("Can't add new comments kindly try it later")
        }
        Err(err) => {
            log::warn!("comment on snippet {} failed: {}", id, err);
            Toast::error("Can't add new comments kindly try it later")
        }
    };
    Ok(redirect_with_toast(&target, &toast))
}

pub async fn delete_snippet(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let ctx = PageContext::load(&req, &state, NavPage::SnippetDetail).await;
    let id = parse_id(&path)?;
    let Some(token) = ctx.access_token() else {
        return Ok(ctx.login_redirect(&detail_url(id)));
    };

    match state.api.delete_snippet(id, token).await {
        Ok(()) => {
            log::info!("snippet {} deleted by {}", id, ctx.username().unwrap_or_default());
            Ok(redirect_with_toast("/snippets", &Toast::success("Snippet deleted successfully!")))
        }
        Err(err) => {
            log::warn!("delete of snippet {} failed: {}", id, err);
            Ok(redirect_with_toast(&detail_url(id), &Toast::error(err.user_message())))
        }
    }
}

// === Add / edit ===

struct FormView<'a> {
    heading: &'a str,
    subheading: &'a str,
    action: String,
    cancel_url: String,
    submit_label: &'a str,
    with_style: bool,
    danger_zone: String,
}

fn render_form(view: FormView<'_>, form: &SnippetForm, choices: &LanguageChoices) -> Result<String, AppError> {
    let style_field = if view.with_style && !choices.style_choices.is_empty() {
        let selected = form.style.clone().unwrap_or_default();
        let options: String = choices
            .style_choices
            .iter()
            .map(|c| {
                let sel = if c.key == selected { " selected" } else { "" };
                format!(r#"<option value="{}"{}>{}</option>"#, attr(&c.key), sel, text(&c.value))
            })
            .collect();
        format!(r#"<label for="style">Highlight Style</label><select id="style" name="style">{}</select>"#, options)
    } else if let Some(style) = form.style.as_deref().filter(|s| view.with_style && !s.is_empty()) {
        // No option list loaded; the chosen style still travels with the form.
        format!(r#"<input type="hidden" name="style" value="{}">"#, attr(style))
    } else {
        String::new()
    };

    templates::render(
        "snippet_form.html",
        &[
            ("heading", text(view.heading)),
            ("subheading", text(view.subheading)),
            ("action", attr(&view.action)),
            ("cancel_url", attr(&view.cancel_url)),
            ("title", attr(&form.title)),
            ("language_options", language_select_options(choices, &form.language, false)),
            ("style_field", style_field),
            ("description", text(&form.description)),
            ("code", text(&form.code)),
            ("tags", attr(&form.tags)),
            ("tag_preview", tag_badges(&parse_tags(&form.tags))),
            ("submit_label", text(view.submit_label)),
            ("danger_zone", view.danger_zone),
        ],
    )
}

fn add_view<'a>() -> FormView<'a> {
    FormView {
        heading: "➕ Add New Snippet",
        subheading: "Share a useful piece of code with the community",
        action: "/add-snippet".to_string(),
        cancel_url: "/".to_string(),
        submit_label: "Create Snippet",
        with_style: true,
        danger_zone: String::new(),
    }
}

fn edit_view<'a>(id: i64) -> FormView<'a> {
    FormView {
        heading: "✏️ Edit Snippet",
        subheading: "Update your code snippet",
        action: format!("/edit-snippet/{}", id),
        cancel_url: detail_url(id),
        submit_label: "Update Snippet",
        with_style: false,
        danger_zone: format!(
            r#"<section class="card danger-zone"><h2>Danger Zone</h2><p class="muted">Deleting a snippet cannot be undone.</p>
<a class="btn danger" href="/snippet-detail/{}?confirm_delete=true">🗑️ Delete Snippet</a></section>"#,
            id
        ),
    }
}

pub async fn new_snippet_form(req: HttpRequest, state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let ctx = PageContext::load(&req, &state, NavPage::AddSnippet).await;
    if !ctx.is_authenticated() {
        return auth_required(&ctx, "You need to be logged in to create snippets.");
    }
    let choices = loaders::load_language_choices(&state.api).await;
    let form = SnippetForm {
        style: choices.style_choices.first().map(|c| c.key.clone()),
        ..Default::default()
    };
    let body = render_form(add_view(), &form, &choices)?;
    templates::page(&ctx, "Add Snippet", body)
}

pub async fn create_snippet(
    req: HttpRequest,
    state: web::Data<AppState>,
    form: web::Form<SnippetForm>,
) -> Result<HttpResponse, AppError> {
    let mut ctx = PageContext::load(&req, &state, NavPage::AddSnippet).await;
    let Some(token) = ctx.access_token().map(str::to_string) else {
        return auth_required(&ctx, "You need to be logged in to create snippets.");
    };
    let form = form.into_inner();

    if form.missing_required() {
        ctx.set_toast(Toast::error(REQUIRED_FIELDS_MESSAGE));
        // Re-rendered without touching the backend.
        let choices = LanguageChoices {
            languages: choices_with_current(&form),
            style_choices: Vec::new(),
        };
        let body = render_form(add_view(), &form, &choices)?;
        return templates::page_with_status(&ctx, StatusCode::UNPROCESSABLE_ENTITY, "Add Snippet", body);
    }

    let choices = if form.style.as_deref().map_or(true, str::is_empty) {
        loaders::load_language_choices(&state.api).await
    } else {
        LanguageChoices::default()
    };
    match state.api.create_snippet(&form.to_new_snippet(&choices), &token).await {
        Ok(created) if created.id > 0 => {
            log::info!("snippet {} created by {}", created.id, ctx.username().unwrap_or_default());
            Ok(redirect_with_toast(&detail_url(created.id), &Toast::success("Snippet created successfully!")))
        }
        Ok(_) => {
            ctx.set_toast(Toast::error("No snippet ID returned from server"));
            let body = render_form(add_view(), &form, &loaders::load_language_choices(&state.api).await)?;
            templates::page_with_status(&ctx, StatusCode::BAD_GATEWAY, "Add Snippet", body)
        }
        Err(err) => {
            log::warn!("snippet creation failed: {}", err);
            ctx.set_toast(Toast::error(err.user_message()));
            let body = render_form(add_view(), &form, &loaders::load_language_choices(&state.api).await)?;
            templates::page_with_status(&ctx, StatusCode::BAD_REQUEST, "Add Snippet", body)
        }
    }
}

// Keeps whatever the user picked selectable when the form is re-shown
// without fetching the option list again.
fn choices_with_current(form: &SnippetForm) -> Vec<LanguageOption> {
    if form.language.trim().is_empty() {
        Vec::new()
    } else {
        vec![LanguageOption {
            key: form.language.clone(),
            value: form.language.clone(),
        }]
    }
}

pub async fn edit_snippet_form(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let ctx = PageContext::load(&req, &state, NavPage::EditSnippet).await;
    let id = parse_id(&path)?;
    if !ctx.is_authenticated() {
        return auth_required(&ctx, "You need to be logged in to edit snippets.");
    }
    let data = match loaders::load_snippet_edit(&state.api, id, ctx.access_token()).await {
        Ok(Some(data)) => data,
        Ok(None) => return snippet_missing(&ctx),
        Err(err) => {
            log::warn!("failed to load snippet {} for editing: {}", id, err);
            return snippet_unavailable(&ctx);
        }
    };
    if !is_owner(&ctx, &data.snippet) {
        return permission_denied(&ctx, id);
    }
    let body = render_form(edit_view(id), &SnippetForm::from_snippet(&data.snippet), &data.choices)?;
    templates::page(&ctx, "Edit Snippet", body)
}

fn permission_denied(ctx: &PageContext, id: i64) -> Result<HttpResponse, AppError> {
    templates::page_with_status(
        ctx,
        StatusCode::FORBIDDEN,
        "Access Denied",
        notice(
            "🚫",
            "Access Denied",
            "You can only edit snippets that you created.",
            &detail_url(id),
            "← Back to Snippet",
        ),
    )
}

pub async fn update_snippet(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<String>,
    form: web::Form<SnippetForm>,
) -> Result<HttpResponse, AppError> {
    let mut ctx = PageContext::load(&req, &state, NavPage::EditSnippet).await;
    let id = parse_id(&path)?;
    let Some(token) = ctx.access_token().map(str::to_string) else {
        return auth_required(&ctx, "You need to be logged in to edit snippets.");
    };
    let form = form.into_inner();

    if form.missing_required() {
        ctx.set_toast(Toast::error(REQUIRED_FIELDS_MESSAGE));
        let choices = LanguageChoices {
            languages: choices_with_current(&form),
            style_choices: Vec::new(),
        };
        let body = render_form(edit_view(id), &form, &choices)?;
        return templates::page_with_status(&ctx, StatusCode::UNPROCESSABLE_ENTITY, "Edit Snippet", body);
    }

    match state.api.get_snippet(id, Some(&token)).await {
        Ok(snippet) if is_owner(&ctx, &snippet) => {}
        Ok(snippet) => {
            log::warn!(
                "{} tried to edit snippet {} owned by {}",
                ctx.username().unwrap_or_default(),
                id,
                snippet.author().unwrap_or_default()
            );
            return permission_denied(&ctx, id);
        }
        Err(err) if err.is_not_found() => return snippet_missing(&ctx),
        Err(err) => {
            log::warn!("failed to load snippet {} before update: {}", id, err);
            return snippet_unavailable(&ctx);
        }
    }

    match state.api.update_snippet(id, &form.to_update(), &token).await {
        Ok(_) => Ok(redirect_with_toast(&detail_url(id), &Toast::success("Snippet updated successfully!"))),
        Err(err) => {
            log::warn!("update of snippet {} failed: {}", id, err);
            ctx.set_toast(Toast::error(err.user_message()));
            let body = render_form(edit_view(id), &form, &loaders::load_language_choices(&state.api).await)?;
            templates::page_with_status(&ctx, StatusCode::BAD_REQUEST, "Edit Snippet", body)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(title: &str, language: &str, code: &str) -> SnippetForm {
        SnippetForm {
            title: title.into(),
            language: language.into(),
            code: code.into(),
            ..Default::default()
        }
    }

    #[test]
    fn required_fields() {
        assert!(form("", "rust", "fn main() {}").missing_required());
        assert!(form("T", "", "fn main() {}").missing_required());
        assert!(form("T", "rust", "   ").missing_required());
        assert!(!form("T", "rust", "fn main() {}").missing_required());
    }

    #[test]
    fn new_snippet_payload_is_normalised() {
        let mut f = form("  Hello  ", "Python", " print(1) ");
        f.tags = "a, b,,".into();
        let choices = LanguageChoices {
            languages: vec![],
            style_choices: vec![LanguageOption { key: "monokai".into(), value: "Monokai".into() }],
        };
        let payload = f.to_new_snippet(&choices);
        assert_eq!(payload.title, "Hello");
        assert_eq!(payload.language, "python");
        assert_eq!(payload.code, "print(1)");
        assert_eq!(payload.tags, vec!["a", "b"]);
        assert_eq!(payload.style, "monokai");
        assert_eq!(f.to_new_snippet(&LanguageChoices::default()).style, DEFAULT_STYLE);
    }

    #[test]
    fn highlighted_code_is_sanitized() {
        let html = r#"<div class="highlight"><pre><span class="k">fn</span><script>alert(1)</script></pre></div>"#;
        let clean = sanitize_highlighted(html);
        assert!(clean.contains(r#"<span class="k">fn</span>"#));
        assert!(!clean.contains("script"));
    }

    #[test]
    fn plain_code_is_escaped() {
        let snippet = Snippet {
            code: Some("a < b && c".into()),
            ..Default::default()
        };
        assert_eq!(render_code(&snippet), "<pre><code>a &lt; b &amp;&amp; c</code></pre>");
    }
}
