//! Pure extraction of game entries from fetched page bodies.
//!
//! The extractor interprets the strategy data registered per platform: for
//! each field it runs the strategies in order and accepts the first
//! non-empty result, so the most structured match wins and the most
//! permissive match is a last resort. Strategies never touch the network or
//! any session state; an empty result is a valid outcome, not an error.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::platform::{DetailField, DetailStrategy, ListStrategy, NameSource, PlatformSpec};
use crate::url::{clean_candidate_url, resolve_and_normalize};

/// A `(name, detail_url)` pair discovered on a list page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    pub name: String,
    pub url: Url,
}

/// Playable addresses extracted from a detail page. Both fields may be
/// empty when no strategy matched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailExtract {
    pub embed_url: String,
    pub iframe_url: String,
}

impl DetailExtract {
    pub fn is_empty(&self) -> bool {
        self.embed_url.is_empty() && self.iframe_url.is_empty()
    }
}

/// Extracts game entries from a list page body.
///
/// Candidate URLs are resolved against `base` and normalized; entries with
/// invalid names (media labels, too short) or disqualified paths (category
/// pages, blogs) are dropped, and duplicates within the page are collapsed
/// in first-seen order.
pub fn extract_list(body: &str, base: &Url, spec: &PlatformSpec) -> Vec<ListEntry> {
    for strategy in spec.list_strategies {
        let entries = apply_list_strategy(strategy, body, base, spec);
        if !entries.is_empty() {
            return entries;
        }
    }
    Vec::new()
}

/// Extracts the playable address from a detail page body.
///
/// The result lands in `embed_url` or `iframe_url` according to the
/// platform's registered [`DetailField`].
pub fn extract_detail(body: &str, source_url: &Url, spec: &PlatformSpec) -> DetailExtract {
    let mut extract = DetailExtract::default();

    for strategy in spec.detail_strategies {
        if let Some(candidate) = apply_detail_strategy(strategy, body, source_url) {
            match spec.detail_field {
                DetailField::Embed => extract.embed_url = candidate,
                DetailField::Iframe => extract.iframe_url = candidate,
            }
            break;
        }
    }

    extract
}

fn apply_list_strategy(
    strategy: &ListStrategy,
    body: &str,
    base: &Url,
    spec: &PlatformSpec,
) -> Vec<ListEntry> {
    let raw_entries: Vec<(String, String)> = match strategy {
        ListStrategy::Selector { selector, name } => {
            let Ok(sel) = Selector::parse(selector) else {
                return Vec::new();
            };
            let document = Html::parse_document(body);
            document
                .select(&sel)
                .filter_map(|element| {
                    let href = element.value().attr("href")?;
                    let name = element_name(&element, name)?;
                    Some((name, href.to_string()))
                })
                .collect()
        }
        ListStrategy::HrefContains { fragment } => scan_hrefs(body, fragment),
    };

    let mut seen = std::collections::HashSet::new();
    let mut entries = Vec::new();

    for (name, href) in raw_entries {
        let Ok(url) = resolve_and_normalize(&href, base) else {
            continue;
        };
        if !is_valid_entry(&name, &url, spec) {
            continue;
        }
        if seen.insert(url.as_str().to_string()) {
            entries.push(ListEntry { name, url });
        }
    }

    entries
}

fn apply_detail_strategy(
    strategy: &DetailStrategy,
    body: &str,
    source_url: &Url,
) -> Option<String> {
    let raw = match strategy {
        DetailStrategy::ElementAttr {
            selector,
            attrs,
            must_contain,
        } => {
            let sel = Selector::parse(selector).ok()?;
            let document = Html::parse_document(body);
            document.select(&sel).find_map(|element| {
                attrs.iter().find_map(|attr| {
                    let value = element.value().attr(attr)?;
                    if value.trim().is_empty() {
                        return None;
                    }
                    if let Some(fragment) = must_contain {
                        if !value.contains(fragment) {
                            return None;
                        }
                    }
                    Some(value.to_string())
                })
            })?
        }
        DetailStrategy::BodyRegex { pattern, group } => {
            let re = Regex::new(pattern).ok()?;
            let captures = re.captures(body)?;
            captures.get(*group)?.as_str().to_string()
        }
        DetailStrategy::EmbedSuffix { suffix } => {
            format!("{}{}", source_url.as_str(), suffix)
        }
        DetailStrategy::EmbedFromSlug {
            strip_prefix,
            template,
        } => {
            let slug = source_url
                .path()
                .strip_prefix(strip_prefix)?
                .trim_matches('/');
            if slug.is_empty() {
                return None;
            }
            template.replace("{slug}", slug)
        }
    };

    let cleaned = clean_candidate_url(&raw)?;
    let resolved = resolve_and_normalize(&cleaned, source_url).ok()?;
    Some(resolved.to_string())
}

/// Pulls href values out of the raw body; last-resort list extraction when
/// the structured selectors come up empty.
fn scan_hrefs(body: &str, fragment: &str) -> Vec<(String, String)> {
    let Ok(re) = Regex::new(r#"href=["']([^"']+)["']"#) else {
        return Vec::new();
    };
    re.captures_iter(body)
        .filter_map(|captures| {
            let href = captures.get(1)?.as_str();
            if !href.contains(fragment) {
                return None;
            }
            Some((name_from_slug(href), href.to_string()))
        })
        .collect()
}

fn element_name(element: &ElementRef, source: &NameSource) -> Option<String> {
    let name = match source {
        NameSource::Text => element.text().collect::<String>(),
        NameSource::ImgTitleOrAlt => {
            let img = Selector::parse("img").ok()?;
            let img = element.select(&img).next()?;
            img.value()
                .attr("title")
                .or_else(|| img.value().attr("alt"))?
                .to_string()
        }
        NameSource::ChildText(selector) => {
            let sel = Selector::parse(selector).ok()?;
            element.select(&sel).next()?.text().collect::<String>()
        }
    };
    let name = name.trim().to_string();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Derives a readable name from the final path segment of a game URL.
fn name_from_slug(href: &str) -> String {
    let slug = href
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or("");
    slug.split(['-', '_'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_valid_entry(name: &str, url: &Url, spec: &PlatformSpec) -> bool {
    if name.len() < 2 {
        return false;
    }
    let lowered_name = name.to_lowercase();
    if spec.invalid_names.iter().any(|n| *n == lowered_name) {
        return false;
    }

    let Some(host) = url.host_str() else {
        return false;
    };
    let Ok(base) = Url::parse(spec.base_url) else {
        return false;
    };
    let Some(base_host) = base.host_str() else {
        return false;
    };
    if !host_matches(host, base_host) {
        return false;
    }

    let lowered = url.as_str().to_lowercase();
    !spec
        .invalid_path_fragments
        .iter()
        .any(|fragment| lowered.contains(fragment))
}

/// True when `candidate` is the platform host or one of its subdomains.
fn host_matches(candidate: &str, base: &str) -> bool {
    let candidate = candidate.strip_prefix("www.").unwrap_or(candidate);
    let base = base.strip_prefix("www.").unwrap_or(base);
    candidate == base || candidate.ends_with(&format!(".{}", base))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::Platform;

    fn base(spec: &PlatformSpec) -> Url {
        Url::parse(&spec.list_url(0)).unwrap()
    }

    #[test]
    fn test_itch_list_extraction() {
        let spec = Platform::Itch.spec();
        let body = r#"<html><body>
            <a class="title game_link" data-action="game_grid" href="https://alice.itch.io/tower">Tower Climb</a>
            <a class="title game_link" data-action="game_grid" href="https://bob.itch.io/cave">Cave Runner</a>
            <a class="title game_link" data-action="game_grid" href="https://itch.io/jam/winter">Winter Jam</a>
        </body></html>"#;
        let entries = extract_list(body, &base(spec), spec);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "Tower Climb");
        assert_eq!(entries[0].url.as_str(), "https://alice.itch.io/tower");
        // The /jam/ link is disqualified
        assert!(entries.iter().all(|e| !e.url.as_str().contains("/jam/")));
    }

    #[test]
    fn test_itch_list_fallback_selector() {
        let spec = Platform::Itch.spec();
        // No data-action attribute: the first strategy misses, the second hits
        let body = r#"<a class="game_link" href="https://alice.itch.io/tower">Tower Climb</a>"#;
        let entries = extract_list(body, &base(spec), spec);
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_list_dedupes_within_page() {
        let spec = Platform::Itch.spec();
        let body = r#"
            <a class="game_link" href="https://alice.itch.io/tower">Tower Climb</a>
            <a class="game_link" href="https://alice.itch.io/tower/">Tower Climb</a>
        "#;
        let entries = extract_list(body, &base(spec), spec);
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_azgames_list_name_from_img() {
        let spec = Platform::AzGames.spec();
        let body = r#"<div class="us-grid-game">
            <a class="us-game-link" href="/subway-moto"><img title="Subway Moto" src="/thumb.webp"></a>
        </div>"#;
        let entries = extract_list(body, &base(spec), spec);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "Subway Moto");
        assert_eq!(entries[0].url.as_str(), "https://azgames.io/subway-moto");
    }

    #[test]
    fn test_media_names_filtered() {
        let spec = Platform::Itch.spec();
        let body = r#"<a class="game_link" href="https://alice.itch.io/tower">gif</a>"#;
        assert!(extract_list(body, &base(spec), spec).is_empty());
    }

    #[test]
    fn test_foreign_host_filtered() {
        let spec = Platform::AzGames.spec();
        let body = r#"<div class="us-grid-game">
            <a class="us-game-link" href="https://evil.example/game"><img title="Game"></a>
        </div>"#;
        assert!(extract_list(body, &base(spec), spec).is_empty());
    }

    #[test]
    fn test_gameflare_href_scan_fallback() {
        let spec = Platform::GameFlare.spec();
        // No anchor elements survive parsing oddities; raw scan still works
        let body = r#"<div data-x='href="/online-game/dino-island/"'></div>"#;
        let entries = extract_list(body, &base(spec), spec);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "Dino Island");
        assert_eq!(
            entries[0].url.as_str(),
            "https://www.gameflare.com/online-game/dino-island"
        );
    }

    #[test]
    fn test_itch_detail_iframe_tag() {
        let spec = Platform::Itch.spec();
        let source = Url::parse("https://alice.itch.io/tower").unwrap();
        let body = r#"<iframe src="https://html-classic.itch.zone/html/123/tower/index.html?v=99"></iframe>"#;
        let extract = extract_detail(body, &source, spec);
        assert_eq!(
            extract.iframe_url,
            "https://html-classic.itch.zone/html/123/tower/index.html"
        );
        assert_eq!(extract.embed_url, "");
    }

    #[test]
    fn test_itch_detail_regex_fallback_and_doubled_segment() {
        let spec = Platform::Itch.spec();
        let source = Url::parse("https://alice.itch.io/tower").unwrap();
        let body = r#"<script>var opts = {"url": "https://html-classic.itch.zone/html/123/tower/index.html/index.html"};</script>"#;
        let extract = extract_detail(body, &source, spec);
        assert_eq!(
            extract.iframe_url,
            "https://html-classic.itch.zone/html/123/tower/index.html"
        );
    }

    #[test]
    fn test_azgames_detail_comment_scan() {
        let spec = Platform::AzGames.spec();
        let source = Url::parse("https://azgames.io/subway-moto").unwrap();
        let body = r#"<!-- <div class="az-games__embed-link">https://azgames.io/subway-moto.embed</div> -->"#;
        let extract = extract_detail(body, &source, spec);
        assert_eq!(extract.embed_url, "https://azgames.io/subway-moto.embed");
    }

    #[test]
    fn test_azgames_detail_suffix_inference() {
        let spec = Platform::AzGames.spec();
        let source = Url::parse("https://azgames.io/subway-moto").unwrap();
        let extract = extract_detail("<html><body>nothing here</body></html>", &source, spec);
        assert_eq!(extract.embed_url, "https://azgames.io/subway-moto.embed");
    }

    #[test]
    fn test_armorgames_detail_data_src() {
        let spec = Platform::ArmorGames.spec();
        let source = Url::parse("https://armorgames.com/play/18712/game").unwrap();
        let body = r#"<iframe id="html-game-frame" data-src="https://files5.cache.armorgames.com/files/games/g-18712/index.html?v=123"></iframe>"#;
        let extract = extract_detail(body, &source, spec);
        assert_eq!(
            extract.embed_url,
            "https://files5.cache.armorgames.com/files/games/g-18712/index.html"
        );
    }

    #[test]
    fn test_gameflare_detail_slug_inference() {
        let spec = Platform::GameFlare.spec();
        let source =
            Url::parse("https://www.gameflare.com/online-game/dinosaur-island-survival").unwrap();
        let extract = extract_detail("<html></html>", &source, spec);
        assert_eq!(
            extract.embed_url,
            "https://www.gameflare.com/embed/dinosaur-island-survival"
        );
    }

    #[test]
    fn test_zapgames_detail_iframe() {
        let spec = Platform::ZapGames.spec();
        let source = Url::parse("https://zapgames.io/im-not-a-robot").unwrap();
        let body = r#"<iframe src="/im-not-a-robot.embed"></iframe>"#;
        let extract = extract_detail(body, &source, spec);
        assert_eq!(extract.embed_url, "https://zapgames.io/im-not-a-robot.embed");
    }

    #[test]
    fn test_empty_extraction_is_not_an_error() {
        let spec = Platform::Itch.spec();
        let source = Url::parse("https://alice.itch.io/tower").unwrap();
        let extract = extract_detail("<html><body>no game</body></html>", &source, spec);
        assert!(extract.is_empty());
    }
}
