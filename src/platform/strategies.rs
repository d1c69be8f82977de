//! Extraction strategy descriptions
//!
//! Strategies are pure data; the `extract` module interprets them. Each
//! platform registers an ordered list, most structured first and most
//! permissive last, and the first strategy producing a non-empty result
//! wins.

/// Where a list strategy finds the display name of a game link.
#[derive(Debug, Clone, Copy)]
pub enum NameSource {
    /// The link element's own text content
    Text,
    /// `title` or `alt` attribute of a child `img` element
    ImgTitleOrAlt,
    /// Text content of the first child matching a CSS selector
    ChildText(&'static str),
}

/// A strategy for extracting `(name, detail_url)` pairs from a list page.
#[derive(Debug, Clone, Copy)]
pub enum ListStrategy {
    /// CSS selector over anchor elements; href attribute is the detail URL
    Selector {
        selector: &'static str,
        name: NameSource,
    },
    /// Raw scan of the body for href attributes containing a fragment.
    /// Names are derived from the URL slug; last-resort only.
    HrefContains { fragment: &'static str },
}

/// Which record field a platform's detail extraction fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailField {
    Embed,
    Iframe,
}

/// A strategy for extracting the playable address from a detail page.
#[derive(Debug, Clone, Copy)]
pub enum DetailStrategy {
    /// CSS selector; the first listed attribute that is present wins.
    /// `must_contain` filters out unrelated frames (ads, social embeds).
    ElementAttr {
        selector: &'static str,
        attrs: &'static [&'static str],
        must_contain: Option<&'static str>,
    },
    /// Regex over the raw body; `group` 0 means the whole match
    BodyRegex {
        pattern: &'static str,
        group: usize,
    },
    /// Infer the address by appending a suffix to the detail-page URL
    /// (e.g. `https://zapgames.io/slug` -> `https://zapgames.io/slug.embed`)
    EmbedSuffix { suffix: &'static str },
    /// Infer the address from the detail-page slug via a template with a
    /// `{slug}` placeholder
    EmbedFromSlug {
        strip_prefix: &'static str,
        template: &'static str,
    },
}
