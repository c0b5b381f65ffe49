//! Overview, contributors and languages pages.

use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;

use crate::config::CONTRIBUTORS_PER_PAGE;
use crate::core::errors::AppError;
use crate::core::helpers::{color_by_index, initial, month_year, rank_badge, time_ago};
use crate::core::query_params::{get_int, get_string, Pagination};
use crate::loaders;
use crate::models::models::{Contributor, LanguageSummary, Snippet};
use crate::templates::{self, attr, pagination_nav, text};
use crate::ui::{NavPage, PageContext};
use crate::AppState;

const LANGUAGE_DESCRIPTIONS: &[(&str, &str)] = &[
    ("python", "Python is the leading language for AI, data science, and general-purpose programming due to its simplicity and rich libraries."),
    ("java", "Java remains a staple for enterprise applications and Android development with its stability and cross-platform capabilities."),
    ("javascript", "JavaScript dominates web development, enabling interactive front-end and increasingly back-end solutions with Node.js."),
    ("cpp", "C++ is a high-performance language extensively used in systems programming, games, and performance-critical applications."),
    ("c", "C is a foundational language known for low-level programming and system software, valued for its speed and control."),
    ("csharp", "C# is popular for Windows applications and game development, especially with the Unity engine, focusing on productivity."),
    ("typescript", "TypeScript builds on JavaScript by adding static typing, improving developer tooling and code robustness."),
    ("sql", "SQL is the core language for managing and querying relational databases, critical for data-driven applications."),
    ("go", "Go, or Golang, is valued for simplicity, concurrency support, and efficiency mainly in cloud services and backend systems."),
    ("php", "PHP remains widely used for server-side web development powering many websites despite mixed opinions about its design."),
    ("rust", "Rust is growing rapidly for its memory safety and performance, ideal for system programming and secure software."),
    ("swift", "Swift is Apple's modern language for iOS and macOS applications, known for safety and developer friendliness."),
    ("ruby", "Ruby focuses on simplicity and productivity, well-known for web development with the Ruby on Rails framework."),
    ("kotlin", "Kotlin is increasingly favored for Android development as a concise, modern alternative to Java."),
    ("r", "R is specialized for statistical computing and data analysis with a vast ecosystem of packages."),
    ("matlab", "MATLAB is used in academic and engineering communities for numerical computing and simulations."),
    ("dart", "Dart powers Flutter apps for cross-platform mobile and web development with fast UI rendering."),
    ("scala", "Scala blends object-oriented and functional programming and is used in big data and backend systems."),
    ("perl", "Perl is a versatile scripting language used for text processing, system administration, and legacy applications."),
    ("fortran", "Fortran is a longtime favorite in scientific computing, known for numerical precision and performance."),
    ("lua", "Lua is a lightweight scripting language embedded in games and applications for easy extensibility."),
    ("groovy", "Groovy is a dynamic JVM language used for scripting, testing, and building tools with concise syntax."),
    ("shell", "Shell scripting automates tasks in Unix/Linux environments, integral for system administration."),
    ("objectivec", "Objective-C is Apple's older language for iOS/macOS before Swift, still maintained for legacy apps."),
    ("powershell", "PowerShell is a powerful task automation framework commonly used in Windows environments."),
    ("elixir", "Elixir is a functional language targeting highly concurrent and fault-tolerant systems with the Erlang VM."),
    ("clojure", "Clojure is a modern Lisp dialect for the JVM emphasizing immutability and functional programming."),
    ("julia", "Julia is designed for high-performance numerical analysis and computational science with easy syntax."),
    ("scratch", "Scratch is a visual programming language aimed at teaching coding fundamentals to beginners and kids."),
    ("ada", "Ada is known for its reliability and safety, used primarily in critical systems like aviation and defense."),
    ("html", "HTML is the foundational markup language for creating and structuring content on the web."),
    ("css", "CSS is the stylesheet language used to design and visually style web pages and user interfaces."),
];

pub fn language_description(language: &str) -> Option<&'static str> {
    LANGUAGE_DESCRIPTIONS
        .iter()
        .find(|(key, _)| *key == language)
        .map(|(_, description)| *description)
}

/// Case-insensitive match on the username or any of the top languages.
pub fn filter_contributors<'a>(contributors: &'a [Contributor], query: &str) -> Vec<&'a Contributor> {
    let needle = query.to_lowercase();
    contributors
        .iter()
        .filter(|c| {
            c.username.to_lowercase().contains(&needle)
                || c.top_languages.iter().any(|l| l.to_lowercase().contains(&needle))
        })
        .collect()
}

/// Case-insensitive match on the language name or its description.
pub fn filter_languages<'a>(languages: &'a [LanguageSummary], query: &str) -> Vec<&'a LanguageSummary> {
    let needle = query.to_lowercase();
    languages
        .iter()
        .filter(|l| {
            l.language.to_lowercase().contains(&needle)
                || language_description(&l.language)
                    .map(|d| d.to_lowercase().contains(&needle))
                    .unwrap_or(false)
        })
        .collect()
}

fn empty_state(icon: &str, message: &str) -> String {
    format!(
        r#"<div class="notice"><span class="notice-icon">{}</span><p class="muted">{}</p></div>"#,
        icon,
        text(message)
    )
}

fn percentage_bar(color: &str, percentage: f64) -> String {
    let width = percentage.clamp(0.0, 100.0);
    format!(
        r#"<div class="bar"><span style="width: {:.1}%; background: {}"></span></div>"#,
        width, color
    )
}

// === Overview ===

fn latest_item(snippet: &Snippet) -> String {
    let updated = snippet
        .updated_date
        .as_deref()
        .map(|ts| time_ago(ts, Utc::now()))
        .unwrap_or_default();
    format!(
        r#"<a class="list-item" href="/snippet-detail/{}"><strong>{}</strong> <span class="badge">{}</span><br><span class="muted">👤 {} · {}</span></a>"#,
        snippet.id,
        text(&snippet.title),
        text(snippet.language.as_deref().unwrap_or("unknown")),
        text(snippet.author().unwrap_or("NA")),
        updated
    )
}

fn top_contributor_item(index: usize, contributor: &Contributor) -> String {
    format!(
        r#"<div class="list-item"><span class="rank">{}</span> <span class="avatar">{}</span> <strong>{}</strong> <span class="muted">{} snippets</span></div>"#,
        rank_badge(index),
        text(&initial(&contributor.username)),
        text(&contributor.username),
        contributor.total_snippets
    )
}

fn top_language_item(index: usize, language: &LanguageSummary) -> String {
    let color = color_by_index(index);
    format!(
        r#"<div class="list-item"><span class="dot" style="background: {color}"></span> <strong>{name}</strong> <span class="muted">{total} snippets · {pct}%</span>{bar}</div>"#,
        color = color,
        name = text(&language.language),
        total = language.total_snippets,
        pct = language.percentage,
        bar = percentage_bar(color, language.percentage)
    )
}

pub async fn overview(req: HttpRequest, state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let ctx = PageContext::load(&req, &state, NavPage::Overview).await;
    let data = loaders::load_overview(&state.api).await;

    let add_link = if ctx.is_authenticated() {
        r#"<a class="btn" href="/add-snippet">➕ Add Snippet</a>"#.to_string()
    } else {
        format!(r#"<a class="btn" href="{}">📝 Login to Add Snippet</a>"#, attr(&ctx.login_url()))
    };

    let latest = if data.latest_snippets.is_empty() {
        empty_state("📄", "No snippets yet.")
    } else {
        data.latest_snippets.iter().map(latest_item).collect()
    };
    let contributors = if data.top_contributors.is_empty() {
        empty_state("🌟", "No contributors yet.")
    } else {
        data.top_contributors
            .iter()
            .enumerate()
            .map(|(i, c)| top_contributor_item(i, c))
            .collect()
    };
    let languages = if data.top_languages.is_empty() {
        empty_state("🧠", "No language statistics yet.")
    } else {
        data.top_languages
            .iter()
            .enumerate()
            .map(|(i, l)| top_language_item(i, l))
            .collect()
    };

    let body = templates::render(
        "overview.html",
        &[
            ("add_link", add_link),
            ("latest", latest),
            ("contributors", contributors),
            ("languages", languages),
        ],
    )?;
    templates::page(&ctx, "Overview", body)
}

// === Contributors ===

fn contributor_card(rank: usize, contributor: &Contributor) -> String {
    let languages: String = contributor
        .top_languages
        .iter()
        .map(|l| format!(r#"<span class="badge">{}</span>"#, text(l)))
        .collect();
    let member_since = contributor
        .date_joined
        .as_deref()
        .map(month_year)
        .filter(|s| !s.is_empty())
        .map(|s| format!("Member since {}", s))
        .unwrap_or_default();
    let active = contributor
        .last_login
        .as_deref()
        .map(|ts| time_ago(ts, Utc::now()))
        .filter(|s| !s.is_empty())
        .map(|s| format!("Active {}", s))
        .unwrap_or_default();
    format!(
        r#"<div class="card contributor">
  <span class="rank">{rank}</span>
  <span class="avatar">{initial}</span>
  <h3>{name}</h3>
  <p class="muted">{since}</p>
  <div class="stats"><div><strong>{total}</strong><br><span class="muted">Snippets</span></div><div><span class="muted">{active}</span></div></div>
  <div>{languages}</div>
</div>"#,
        rank = rank_badge(rank),
        initial = text(&initial(&contributor.username)),
        name = text(&contributor.username),
        since = member_since,
        total = contributor.total_snippets,
        active = active,
        languages = languages,
    )
}

pub async fn contributors(req: HttpRequest, state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let ctx = PageContext::load(&req, &state, NavPage::Contributors).await;
    let all = loaders::load_contributors(&state.api).await;
    let query = get_string(&ctx.params, "query", None).unwrap_or_default();
    let filtered = filter_contributors(&all, &query);
    let pagination = Pagination::new(get_int(&ctx.params, "page", 1), CONTRIBUTORS_PER_PAGE, filtered.len());

    let cards = if filtered.is_empty() {
        empty_state("🔍", "No contributors match your search.")
    } else {
        let offset = pagination.offset();
        let cards: String = pagination
            .slice(&filtered)
            .iter()
            .enumerate()
            .map(|(i, c)| contributor_card(offset + i, c))
            .collect();
        format!(r#"<div class="grid">{}</div>"#, cards)
    };

    let body = templates::render(
        "contributors.html",
        &[
            ("query", attr(&query)),
            ("cards", cards),
            ("pagination", pagination_nav(&ctx, &pagination)),
        ],
    )?;
    templates::page(&ctx, "Top Contributors", body)
}

// === Languages ===

fn language_card(index: usize, language: &LanguageSummary) -> String {
    let color = color_by_index(index);
    let recent: String = language
        .recent_snippets
        .iter()
        .map(|s| {
            format!(
                r#"<li><a href="/snippet-detail/{}">{}</a> <span class="muted">{}</span></li>"#,
                s.id,
                text(&s.title),
                text(s.coder_username.as_deref().unwrap_or_default())
            )
        })
        .collect();
    let contributors: String = language
        .top_contributors
        .iter()
        .map(|c| format!(r#"<span class="badge">{} ({})</span>"#, text(&c.username), c.total_snippets))
        .collect();
    format!(
        r#"<div class="card language">
  <header class="section-head">
    <h3><span class="dot" style="background: {color}"></span> {name}</h3>
    <span class="rank">#{rank}</span>
  </header>
  <p class="muted">{description}</p>
  <div class="stats"><div>📄 <strong>{snippets}</strong><br><span class="muted">Code Snippets</span></div><div>👥 <strong>{contributors_total}</strong><br><span class="muted">Contributors</span></div></div>
  <p>Popularity <span class="muted">{pct}%</span></p>
  {bar}
  <h4>Recent Snippets</h4>
  <ul>{recent}</ul>
  <h4>Top Contributors</h4>
  <div>{contributors}</div>
  <a class="btn outline" href="/snippets?language={lang_param}">View {name} snippets</a>
</div>"#,
        color = color,
        name = text(&language.language),
        rank = index + 1,
        description = text(language_description(&language.language).unwrap_or_default()),
        snippets = language.total_snippets,
        contributors_total = language.total_contributors,
        pct = language.percentage,
        bar = percentage_bar(color, language.percentage),
        recent = recent,
        contributors = contributors,
        lang_param = attr(&urlencoding::encode(&language.language)),
    )
}

pub async fn languages(req: HttpRequest, state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let ctx = PageContext::load(&req, &state, NavPage::Languages).await;
    let stats = loaders::load_language_stats(&state.api).await;
    let query = get_string(&ctx.params, "query", None).unwrap_or_default();
    let filtered = filter_languages(&stats, &query);

    let cards = if filtered.is_empty() {
        empty_state("🔍", "No languages match your search.")
    } else {
        let cards: String = filtered
            .iter()
            .enumerate()
            .map(|(i, l)| language_card(i, l))
            .collect();
        format!(r#"<div class="grid">{}</div>"#, cards)
    };

    let body = templates::render("languages.html", &[("query", attr(&query)), ("cards", cards)])?;
    templates::page(&ctx, "Programming Languages", body)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contributor(id: i64, username: &str, languages: &[&str]) -> Contributor {
        Contributor {
            id,
            username: username.into(),
            top_languages: languages.iter().map(|l| l.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn contributors_match_name_or_language() {
        let all = vec![
            contributor(1, "ana", &["Rust"]),
            contributor(2, "bob", &["Python", "SQL"]),
        ];
        assert_eq!(filter_contributors(&all, "PYTH").len(), 1);
        assert_eq!(filter_contributors(&all, "an")[0].username, "ana");
        assert_eq!(filter_contributors(&all, "").len(), 2);
    }

    #[test]
    fn languages_match_description() {
        let stats = vec![
            LanguageSummary { language: "rust".into(), ..Default::default() },
            LanguageSummary { language: "go".into(), ..Default::default() },
        ];
        let hits = filter_languages(&stats, "memory safety");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].language, "rust");
        assert!(language_description("brainfuck").is_none());
    }

    #[test]
    fn bar_width_is_clamped() {
        assert!(percentage_bar("#fff", 140.0).contains("width: 100.0%"));
    }
}
