use std::collections::HashMap;

/// Parse query parameters from a URI string
///
/// Handles URL decoding (including `+` as a space, which is what HTML GET
/// forms send) and returns a HashMap of parameter key-value pairs. Multiple
/// values for the same key are not supported (only the last is kept).
///
/// # Example
/// ```
/// use awesome_snippets::core::query_params::parse_query_params;
///
/// let params = parse_query_params("/snippets?language=rust&query=quick+sort");
/// assert_eq!(params.get("language"), Some(&"rust".to_string()));
/// assert_eq!(params.get("query"), Some(&"quick sort".to_string()));
/// ```
pub fn parse_query_params(uri: &str) -> HashMap<String, String> {
    let query = match uri.find('?') {
        Some(query_start) => &uri[query_start + 1..],
        None if uri.contains('=') => uri,
        None => return HashMap::new(),
    };

    query
        .split('&')
        .filter(|param| !param.is_empty())
        .map(|param| match param.split_once('=') {
            Some((key, value)) => (decode(key), decode(value)),
            // Flag parameter without value
            None => (decode(param), String::new()),
        })
        .collect()
}

fn decode(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|s| s.into_owned())
        .unwrap_or(spaced)
}

/// Get a non-empty string parameter from parsed query params with optional default
pub fn get_string(params: &HashMap<String, String>, key: &str, default: Option<&str>) -> Option<String> {
    params
        .get(key)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| default.map(|d| d.to_string()))
}

/// Get a boolean flag parameter (e.g., ?show_login_modal=true)
pub fn get_bool_flag(params: &HashMap<String, String>, key: &str) -> bool {
    params.get(key).map(|v| v == "true").unwrap_or(false)
}

/// Get an integer parameter with validation and default
pub fn get_int(params: &HashMap<String, String>, key: &str, default: usize) -> usize {
    params
        .get(key)
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(default)
        .max(1)
}

/// Re-encodes params into a query string, skipping `exclude` and empty values.
/// Keys come out sorted so generated links are stable.
pub fn build_query(params: &HashMap<String, String>, exclude: &[&str]) -> String {
    let mut pairs: Vec<(&String, &String)> = params
        .iter()
        .filter(|(k, v)| !exclude.contains(&k.as_str()) && !v.is_empty())
        .collect();
    pairs.sort();
    pairs
        .into_iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Path plus re-encoded query. `exclude` drops existing keys, then `extra`
/// pairs are added on top.
pub fn link_with(path: &str, params: &HashMap<String, String>, exclude: &[&str], extra: &[(&str, &str)]) -> String {
    let mut merged: HashMap<String, String> = params
        .iter()
        .filter(|(k, _)| !exclude.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    for (key, value) in extra {
        merged.insert(key.to_string(), value.to_string());
    }
    let query = build_query(&merged, &[]);
    if query.is_empty() {
        path.to_string()
    } else {
        format!("{}?{}", path, query)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pagination {
    pub current_page: usize,
    pub per_page: usize,
    pub total_items: usize,
}

impl Pagination {
    /// Pages past the end are pulled back to the last page.
    pub fn new(current_page: usize, per_page: usize, total_items: usize) -> Self {
        let per_page = per_page.max(1);
        let last_page = total_items.div_ceil(per_page).max(1);
        Self {
            current_page: current_page.clamp(1, last_page),
            per_page,
            total_items,
        }
    }

    pub fn total_pages(&self) -> usize {
        self.total_items.div_ceil(self.per_page)
    }

    pub fn offset(&self) -> usize {
        (self.current_page - 1).saturating_mul(self.per_page)
    }

    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages()
    }

    /// The slice of an in-memory list that falls on the current page.
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = self.offset().min(items.len());
        let end = start.saturating_add(self.per_page).min(items.len());
        &items[start..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_encoded_values_and_flags() {
        let params = parse_query_params("/snippets?query=hello%20world+again&show_login_modal=true&debug");
        assert_eq!(params.get("query").map(String::as_str), Some("hello world again"));
        assert!(get_bool_flag(&params, "show_login_modal"));
        assert_eq!(params.get("debug").map(String::as_str), Some(""));
    }

    #[test]
    fn page_defaults_and_clamps() {
        let params = parse_query_params("/x?page=0&size=abc");
        assert_eq!(get_int(&params, "page", 1), 1);
        assert_eq!(get_int(&params, "size", 4), 4);
        assert_eq!(get_int(&params, "missing", 3), 3);
    }

    #[test]
    fn links_keep_filters_and_drop_excluded() {
        let params = parse_query_params("/snippets?language=rust&page=3&query=a b");
        assert_eq!(
            link_with("/snippets", &params, &["page"], &[("page", "2")]),
            "/snippets?language=rust&page=2&query=a%20b"
        );
        assert_eq!(link_with("/", &HashMap::new(), &[], &[]), "/");
    }

    #[test]
    fn pagination_math() {
        let p = Pagination::new(1, 4, 10);
        assert_eq!(p.total_pages(), 3);
        assert!(!p.has_previous());
        assert!(p.has_next());

        let last = Pagination::new(3, 4, 10);
        assert_eq!(last.offset(), 8);
        assert!(!last.has_next());

        let items: Vec<u32> = (0..10).collect();
        assert_eq!(last.slice(&items), &[8, 9]);
        assert_eq!(Pagination::new(9, 4, 10), last);
        assert_eq!(Pagination::new(1, 6, 0).total_pages(), 0);
    }

    #[test]
    fn huge_page_number_lands_on_last_page() {
        let p = Pagination::new(usize::MAX, 6, 7);
        assert_eq!(p.current_page, 2);
        assert_eq!(p.offset(), 6);
        assert!(!p.has_next());
        let items: Vec<u32> = (0..7).collect();
        assert_eq!(p.slice(&items), &[6]);

        let empty = Pagination::new(usize::MAX, 6, 0);
        assert_eq!(empty.current_page, 1);
        assert!(empty.slice(&items[..0]).is_empty());
    }
}
