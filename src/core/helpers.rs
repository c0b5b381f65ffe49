use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;

const PALETTE: [&str; 100] = [
    "#33991A", "#FF1A66", "#00B3E6", "#FF6633", "#3366E6", "#FFB399", "#FF33FF", "#FFFF99", "#E6B333", "#999966",
    "#99FF99", "#B34D4D", "#80B300", "#809900", "#E6B3B3", "#6680B3", "#66991A", "#FF99E6", "#CCFF1A", "#E6331A",
    "#33FFCC", "#66994D", "#B366CC", "#4D8000", "#B33300", "#CC80CC", "#66664D", "#991AFF", "#E666FF", "#4DB3FF",
    "#1AB399", "#E666B3", "#CC9999", "#B3B31A", "#00E680", "#4D8066", "#809980", "#E6FF80", "#1AFF33", "#999933",
    "#FF3380", "#CCCC00", "#66E64D", "#4D80CC", "#9900B3", "#E64D66", "#4DB380", "#FF4D4D", "#99E6E6", "#6666FF",
    "#2E8B57", "#D2691E", "#FF7F50", "#6495ED", "#DC143C", "#00008B", "#008B8B", "#B8860B", "#A9A9A9", "#006400",
    "#BDB76B", "#8B008B", "#556B2F", "#FF8C00", "#9932CC", "#8B0000", "#E9967A", "#8FBC8F", "#483D8B", "#2F4F4F",
    "#00CED1", "#9400D3", "#FF1493", "#00BFFF", "#696969", "#1E90FF", "#B22222", "#FFFAF0", "#228B22", "#FF00FF",
    "#DCDCDC", "#F8F8FF", "#FFD700", "#DAA520", "#808080", "#008000", "#ADFF2F", "#F0FFF0", "#FF69B4", "#CD5C5C",
    "#4B0082", "#FFFFF0", "#F0E68C", "#E6E6FA", "#FFF0F5", "#7CFC00", "#FFFACD", "#ADD8E6", "#F08080", "#E0FFFF",
];

pub fn now_epoch() -> i64 {
    Utc::now().timestamp()
}

pub fn color_by_index(index: usize) -> &'static str {
    PALETTE[index % PALETTE.len()]
}

/// Splits a comma separated tag field, trimming and dropping empty entries.
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn parse_timestamp(ts: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(ts)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            chrono::NaiveDateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })
        .or_else(|| {
            chrono::NaiveDate::parse_from_str(ts, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc())
        })
}

/// Human relative time such as "3 days ago", measured against `now`.
pub fn time_ago(ts: &str, now: DateTime<Utc>) -> String {
    let Some(then) = parse_timestamp(ts) else {
        return String::new();
    };
    let secs = (now - then).num_seconds();
    let (secs, suffix) = if secs < 0 { (-secs, false) } else { (secs, true) };
    let phrase = relative_phrase(secs);
    if suffix {
        format!("{} ago", phrase)
    } else {
        format!("in {}", phrase)
    }
}

fn relative_phrase(secs: i64) -> String {
    let minutes = (secs as f64 / 60.0).round() as i64;
    let hours = (secs as f64 / 3600.0).round() as i64;
    let days = (secs as f64 / 86400.0).round() as i64;
    match secs {
        s if s < 45 => "a few seconds".to_string(),
        s if s < 90 => "a minute".to_string(),
        s if s < 45 * 60 => format!("{} minutes", minutes),
        s if s < 90 * 60 => "an hour".to_string(),
        s if s < 22 * 3600 => format!("{} hours", hours),
        s if s < 36 * 3600 => "a day".to_string(),
        s if s < 26 * 86400 => format!("{} days", days),
        s if s < 46 * 86400 => "a month".to_string(),
        s if s < 320 * 86400 => format!("{} months", (days as f64 / 30.4).round() as i64),
        s if s < 548 * 86400 => "a year".to_string(),
        _ => format!("{} years", (days as f64 / 365.0).round() as i64),
    }
}

/// "Apr 2024" style month label, empty when the timestamp does not parse.
pub fn month_year(ts: &str) -> String {
    parse_timestamp(ts)
        .map(|dt| dt.format("%b %Y").to_string())
        .unwrap_or_default()
}

pub fn short_date(ts: &str) -> String {
    parse_timestamp(ts)
        .map(|dt| dt.format("%b %-d, %Y").to_string())
        .unwrap_or_default()
}

fn whitespace_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"\s+").expect("Regex should compile"))
}

/// File name offered when a snippet's code is downloaded.
pub fn download_file_name(title: &str, language: Option<&str>) -> String {
    let title = if title.trim().is_empty() { "snippet" } else { title.trim() };
    let stem = whitespace_regex().replace_all(&title.to_lowercase(), "-").to_string();
    let stem: String = stem
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '_' || *c == '.')
        .collect();
    let ext = match language.unwrap_or("txt").to_lowercase().as_str() {
        "c++" | "cpp" => "cpp",
        "python" => "py",
        _ => "txt",
    };
    format!("{}.{}", stem, ext)
}

pub fn whatsapp_share_url(title: &str, page_url: &str) -> String {
    let text = format!("Check out this code snippet: {}\n{}", title, page_url);
    format!("https://wa.me/?text={}", urlencoding::encode(&text))
}

pub fn twitter_share_url(title: &str, language: &str, page_url: &str) -> String {
    let text = format!("Check out this {} code snippet: {}", language, title);
    format!(
        "https://twitter.com/intent/tweet?text={}&url={}",
        urlencoding::encode(&text),
        urlencoding::encode(page_url)
    )
}

pub fn rank_badge(index: usize) -> String {
    match index {
        0 => "🥇".to_string(),
        1 => "🥈".to_string(),
        2 => "🥉".to_string(),
        n => format!("#{}", n + 1),
    }
}

pub fn initial(username: &str) -> String {
    username
        .chars()
        .next()
        .map(|c| c.to_uppercase().to_string())
        .unwrap_or_else(|| "NA".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn tags_are_trimmed_and_empties_dropped() {
        assert_eq!(parse_tags(" rust, async ,, web ,"), vec!["rust", "async", "web"]);
        assert!(parse_tags("  ,  ").is_empty());
    }

    #[test]
    fn palette_wraps_around() {
        assert_eq!(color_by_index(0), "#33991A");
        assert_eq!(color_by_index(100), "#33991A");
        assert_eq!(color_by_index(101), color_by_index(1));
    }

    #[test]
    fn relative_times() {
        let now = Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap();
        assert_eq!(time_ago("2024-05-10T11:59:50Z", now), "a few seconds ago");
        assert_eq!(time_ago("2024-05-10T11:30:00Z", now), "30 minutes ago");
        assert_eq!(time_ago("2024-05-07T12:00:00Z", now), "3 days ago");
        assert_eq!(time_ago("2022-05-10T12:00:00Z", now), "2 years ago");
        assert_eq!(time_ago("not a date", now), "");
    }

    #[test]
    fn month_labels_accept_backend_formats() {
        assert_eq!(month_year("2024-04-12"), "Apr 2024");
        assert_eq!(month_year("2024-04-12T08:15:00.123456"), "Apr 2024");
        assert_eq!(month_year("2024-04-12T08:15:00+02:00"), "Apr 2024");
    }

    #[test]
    fn download_names() {
        assert_eq!(download_file_name("Quick  Sort", Some("C++")), "quick-sort.cpp");
        assert_eq!(download_file_name("Fib gen", Some("python")), "fib-gen.py");
        assert_eq!(download_file_name("", None), "snippet.txt");
    }

    #[test]
    fn ranks() {
        assert_eq!(rank_badge(0), "🥇");
        assert_eq!(rank_badge(2), "🥉");
        assert_eq!(rank_badge(6), "#7");
    }
}
