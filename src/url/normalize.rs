use crate::UrlError;
use url::Url;

/// Normalizes a URL into the canonical identity form used by the store.
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed or non-HTTP(S)
/// 2. Lowercase the host
/// 3. Normalize the path:
///    - Remove dot segments (`.` and `..`) and empty segments
///    - Collapse consecutive identical segments, so a doubled
///      `/index.html/index.html` becomes `/index.html`
///    - Remove the trailing slash (except for the root `/`)
/// 4. Remove the fragment
/// 5. Drop an empty query string
///
/// Query parameters are otherwise kept as-is: the listing sites addressed
/// here use the query for pagination, which is part of page identity.
///
/// # Examples
///
/// ```
/// use game_quarry::url::normalize_url;
///
/// let url = normalize_url("https://EX.com/a/index.html/index.html").unwrap();
/// assert_eq!(url.as_str(), "https://ex.com/a/index.html");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    let host = url
        .host_str()
        .ok_or(UrlError::MissingHost)?
        .to_lowercase();
    url.set_host(Some(&host))
        .map_err(|e| UrlError::Parse(format!("Failed to set host: {}", e)))?;

    let normalized_path = normalize_path(url.path());
    url.set_path(&normalized_path);

    url.set_fragment(None);

    if url.query() == Some("") {
        url.set_query(None);
    }

    Ok(url)
}

/// Resolves a possibly-relative URL against a base page, then normalizes it.
///
/// List and detail pages frequently carry site-relative hrefs
/// (`/subway-moto`, `//cdn.example/...`); extraction always routes candidate
/// addresses through here before they reach the store.
pub fn resolve_and_normalize(raw: &str, base: &Url) -> Result<Url, UrlError> {
    let joined = base
        .join(raw.trim())
        .map_err(|e| UrlError::Parse(e.to_string()))?;
    normalize_url(joined.as_str())
}

/// Cleans a raw extracted embed/iframe address.
///
/// Handles the escaping noise the listing sites embed in script blobs and
/// HTML comments: entity escapes, backslash escapes, surrounding quotes, and
/// the `?v=` cache-buster some platforms append to their iframe sources.
/// Returns `None` when nothing resembling a URL survives.
pub fn clean_candidate_url(raw: &str) -> Option<String> {
    let mut s = raw
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("\\/", "/")
        .replace("\\\"", "\"")
        .replace('\\', "");

    s = s.trim().trim_matches(|c| c == '"' || c == '\'').to_string();

    // Strip the ?v= cache-buster, keeping anything before it.
    if let Some(idx) = s.find("?v=") {
        s.truncate(idx);
    }

    if s.is_empty() {
        return None;
    }

    Some(s)
}

/// Normalizes a URL path: removes dot and empty segments, collapses
/// consecutive duplicate segments, and strips the trailing slash.
fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                segments.pop();
            }
            _ => {
                // Collapse doubled segments (e.g. a repeated index.html).
                if segments.last() != Some(&segment) {
                    segments.push(segment);
                }
            }
        }
    }

    if segments.is_empty() {
        return "/".to_string();
    }

    format!("/{}", segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercase_host() {
        let result = normalize_url("https://EXAMPLE.COM/Page").unwrap();
        assert_eq!(result.as_str(), "https://example.com/Page");
    }

    #[test]
    fn test_remove_trailing_slash() {
        let result = normalize_url("https://example.com/page/").unwrap();
        assert_eq!(result.as_str(), "https://example.com/page");
    }

    #[test]
    fn test_keep_root_slash() {
        let result = normalize_url("https://example.com/").unwrap();
        assert_eq!(result.as_str(), "https://example.com/");
    }

    #[test]
    fn test_collapse_doubled_index_html() {
        let a = normalize_url("https://ex.com/a/index.html/index.html").unwrap();
        let b = normalize_url("https://ex.com/a/index.html").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "https://ex.com/a/index.html");
    }

    #[test]
    fn test_collapse_multiple_repeats() {
        let result =
            normalize_url("https://ex.com/html/123/index.html/index.html/index.html").unwrap();
        assert_eq!(result.as_str(), "https://ex.com/html/123/index.html");
    }

    #[test]
    fn test_remove_fragment() {
        let result = normalize_url("https://armorgames.com/games/date#games").unwrap();
        assert_eq!(result.as_str(), "https://armorgames.com/games/date");
    }

    #[test]
    fn test_dot_segments() {
        let result = normalize_url("https://example.com/a/../b/./c").unwrap();
        assert_eq!(result.as_str(), "https://example.com/b/c");
    }

    #[test]
    fn test_multiple_slashes() {
        let result = normalize_url("https://example.com///path//to///page").unwrap();
        assert_eq!(result.as_str(), "https://example.com/path/to/page");
    }

    #[test]
    fn test_query_preserved() {
        let result = normalize_url("https://azgames.io/new-games?page=2").unwrap();
        assert_eq!(result.as_str(), "https://azgames.io/new-games?page=2");
    }

    #[test]
    fn test_invalid_scheme() {
        let result = normalize_url("ftp://example.com/page");
        assert!(matches!(result, Err(UrlError::InvalidScheme(_))));
    }

    #[test]
    fn test_malformed_url() {
        assert!(normalize_url("not a url").is_err());
    }

    #[test]
    fn test_resolve_relative_href() {
        let base = Url::parse("https://azgames.io/new-games").unwrap();
        let result = resolve_and_normalize("/subway-moto", &base).unwrap();
        assert_eq!(result.as_str(), "https://azgames.io/subway-moto");
    }

    #[test]
    fn test_resolve_absolute_href() {
        let base = Url::parse("https://itch.io/games").unwrap();
        let result = resolve_and_normalize("https://foo.itch.io/bar", &base).unwrap();
        assert_eq!(result.as_str(), "https://foo.itch.io/bar");
    }

    #[test]
    fn test_clean_strips_version_param() {
        let cleaned = clean_candidate_url(
            "https://files.cache.armorgames.com/files/games/g-12345/index.html?v=1699",
        )
        .unwrap();
        assert_eq!(
            cleaned,
            "https://files.cache.armorgames.com/files/games/g-12345/index.html"
        );
    }

    #[test]
    fn test_clean_unescapes_entities() {
        let cleaned =
            clean_candidate_url("&quot;https:\\/\\/html-classic.itch.zone\\/html\\/1\\/g\\/index.html&quot;")
                .unwrap();
        assert_eq!(cleaned, "https://html-classic.itch.zone/html/1/g/index.html");
    }

    #[test]
    fn test_clean_rejects_empty() {
        assert_eq!(clean_candidate_url("  \"\"  "), None);
    }
}
