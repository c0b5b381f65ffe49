use std::collections::HashMap;

use actix_web::http::header::ContentType;
use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use html_escape::{encode_double_quoted_attribute, encode_text};
use rust_embed::RustEmbed;

use crate::core::errors::AppError;
use crate::core::query_params::{link_with, Pagination};
use crate::ui::{NavPage, PageContext, ToastKind};

#[derive(RustEmbed)]
#[folder = "templates"]
struct Templates;

/// Loads an embedded template and fills its `{{name}}` placeholders in a
/// single pass, so substituted text is never scanned for placeholders again.
/// Values are inserted as given; callers escape anything user supplied.
pub fn render(name: &str, values: &[(&str, String)]) -> Result<String, AppError> {
    let file = Templates::get(name).ok_or_else(|| AppError::InternalError(format!("Template {} not found", name)))?;
    let source = std::str::from_utf8(&file.data)
        .map_err(|e| AppError::InternalError(format!("Template {} is not UTF-8: {}", name, e)))?;
    let lookup: HashMap<&str, &str> = values.iter().map(|(k, v)| (*k, v.as_str())).collect();
    Ok(fill(source, &lookup))
}

fn fill(source: &str, values: &HashMap<&str, &str>) -> String {
    let mut out = String::with_capacity(source.len());
    let mut rest = source;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let key = after[..end].trim();
                match values.get(key) {
                    Some(value) => out.push_str(value),
                    None => {
                        log::warn!("template placeholder {} has no value", key);
                    }
                }
                rest = &after[end + 2..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

pub fn text(value: &str) -> String {
    encode_text(value).into_owned()
}

pub fn attr(value: &str) -> String {
    encode_double_quoted_attribute(value).into_owned()
}

fn nav_link(ctx: &PageContext, page: NavPage, href: &str, label: &str) -> String {
    let class = if ctx.nav.section() == page { "nav-link active" } else { "nav-link" };
    format!(r#"<a class="{}" href="{}">{}</a>"#, class, href, label)
}

fn header(ctx: &PageContext) -> String {
    let links = [
        nav_link(ctx, NavPage::Overview, "/", "Overview"),
        nav_link(ctx, NavPage::Snippets, "/snippets", "Snippets"),
        nav_link(ctx, NavPage::Contributors, "/contributors", "Contributors"),
        nav_link(ctx, NavPage::Languages, "/languages", "Languages"),
    ]
    .join("");

    let account = match ctx.username() {
        Some(username) => format!(
            r#"<a class="nav-link" href="/profile">{}</a>
            <form method="post" action="/auth/logout" class="inline"><button class="btn ghost" type="submit">Logout</button></form>"#,
            text(username)
        ),
        None => format!(r#"<a class="btn" href="{}">Login</a>"#, attr(&ctx.login_url())),
    };

    let theme_label = match ctx.theme {
        crate::ui::Theme::Dark => "☀️",
        crate::ui::Theme::Light => "🌙",
    };

    format!(
        r#"<header class="site-header">
  <a class="brand" href="/">📄 AwesomeCodeSnippets</a>
  <nav>{links}</nav>
  <div class="account">
    <form method="post" action="/theme" class="inline">
      <input type="hidden" name="next" value="{next}">
      <button class="btn ghost" type="submit" title="Toggle dark mode">{theme_label}</button>
    </form>
    {account}
  </div>
</header>"#,
        links = links,
        next = attr(&ctx.current_url()),
        theme_label = theme_label,
        account = account,
    )
}

fn toast(ctx: &PageContext) -> String {
    match &ctx.toast {
        Some(t) if !matches!(t.kind, ToastKind::LoginError | ToastKind::SignupError) => format!(
            r#"<div class="toast toast-{}" role="status">{}</div>"#,
            t.kind_name(),
            text(&t.message)
        ),
        _ => String::new(),
    }
}

fn auth_modal(ctx: &PageContext) -> Result<String, AppError> {
    if ctx.is_authenticated() || !ctx.show_login_modal {
        return Ok(String::new());
    }
    let error_block = |kind: ToastKind| {
        ctx.auth_error(kind)
            .map(|msg| format!(r#"<p class="form-error">{}</p>"#, text(msg).replace('\n', "<br>")))
            .unwrap_or_default()
    };
    render(
        "auth_modal.html",
        &[
            ("next", attr(&ctx.current_url())),
            ("close_url", attr(&ctx.current_url())),
            ("login_error", error_block(ToastKind::LoginError)),
            ("signup_error", error_block(ToastKind::SignupError)),
        ],
    )
}

/// Wraps a page body in the shared layout and sets the one-shot cookies.
pub fn page(ctx: &PageContext, title: &str, body: String) -> Result<HttpResponse, AppError> {
    page_with_status(ctx, StatusCode::OK, title, body)
}

pub fn page_with_status(ctx: &PageContext, status: StatusCode, title: &str, body: String) -> Result<HttpResponse, AppError> {
    let html = render(
        "layout.html",
        &[
            ("title", text(title)),
            ("theme", ctx.theme.as_str().to_string()),
            ("header", header(ctx)),
            ("toast", toast(ctx)),
            ("auth_modal", auth_modal(ctx)?),
            ("body", body),
        ],
    )?;
    let mut builder = HttpResponse::build(status);
    builder.insert_header(ContentType::html());
    ctx.apply_cookies(&mut builder);
    Ok(builder.body(html))
}

/// Small centred notice used for "not found", "authentication required" and
/// permission pages.
pub fn notice(icon: &str, heading: &str, message: &str, back_href: &str, back_label: &str) -> String {
    format!(
        r#"<section class="notice">
  <span class="notice-icon">{}</span>
  <h1>{}</h1>
  <p class="muted">{}</p>
  <a class="btn" href="{}">{}</a>
</section>"#,
        icon,
        text(heading),
        text(message),
        attr(back_href),
        text(back_label)
    )
}

/// Numbered page links; previous/next are marked disabled at the ends.
pub fn pagination_nav(ctx: &PageContext, pagination: &Pagination) -> String {
    let total = pagination.total_pages();
    if total == 0 {
        return String::new();
    }
    let link = |page: usize| link_with(&ctx.path, &ctx.params, &["page", "show_login_modal"], &[("page", &page.to_string())]);
    let edge = |label: &str, enabled: bool, page: usize| {
        if enabled {
            format!(r#"<li><a class="btn outline" href="{}">{}</a></li>"#, attr(&link(page)), label)
        } else {
            format!(r#"<li><a class="btn outline" aria-disabled="true">{}</a></li>"#, label)
        }
    };

    let mut out = String::from(r#"<nav aria-label="pagination"><ul class="pagination">"#);
    out.push_str(&edge("Previous", pagination.has_previous(), pagination.current_page.saturating_sub(1)));
    for page in 1..=total {
        let class = if page == pagination.current_page { "page-link current" } else { "page-link" };
        out.push_str(&format!(r#"<li><a class="{}" href="{}">{}</a></li>"#, class, attr(&link(page)), page));
    }
    out.push_str(&edge("Next", pagination.has_next(), pagination.current_page.saturating_add(1)));
    out.push_str("</ul></nav>");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_is_single_pass() {
        let mut values = HashMap::new();
        values.insert("body", "{{title}}");
        values.insert("title", "T");
        assert_eq!(fill("<h1>{{ title }}</h1>{{body}}", &values), "<h1>T</h1>{{title}}");
    }

    #[test]
    fn fill_keeps_unterminated_braces() {
        let values = HashMap::new();
        assert_eq!(fill("a {{ b", &values), "a {{ b");
        assert_eq!(fill("x{{missing}}y", &values), "xy");
    }

    #[test]
    fn escaping_helpers() {
        assert_eq!(text("<b>&"), "&lt;b&gt;&amp;");
        assert_eq!(attr(r#"a"b"#), "a&quot;b");
    }
}
