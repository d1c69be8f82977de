//! The registered platform specs.
//!
//! Selector and pattern values follow the live structure of each site as of
//! the last verification pass; when a site reworks its markup only this
//! file changes.

use crate::platform::strategies::{DetailField, DetailStrategy, ListStrategy, NameSource};
use crate::platform::Platform;

/// Names that mark a link as media rather than a game.
const INVALID_NAMES: &[&str] = &[
    "gif",
    "video",
    "trailer",
    "preview",
    "demo video",
    "gameplay",
    "screenshot",
    "image",
    "pic",
    "photo",
];

/// Everything the pipeline needs to know about one platform.
#[derive(Debug)]
pub struct PlatformSpec {
    pub platform: Platform,

    /// Base URL for resolving relative hrefs
    pub base_url: &'static str,

    /// Path of the first list page
    pub list_path: &'static str,

    /// Query parameter used for list pagination; None = single list page
    pub page_param: Option<&'static str>,

    /// Ordered list-page strategies, most structured first
    pub list_strategies: &'static [ListStrategy],

    /// Ordered detail-page strategies, most structured first
    pub detail_strategies: &'static [DetailStrategy],

    /// Record field the detail address belongs in
    pub detail_field: DetailField,

    /// Marker a sufficient response body must contain; its absence makes
    /// the orchestrator escalate to the browser transport
    pub marker: Option<&'static str>,

    /// List pages are rendered client-side; skip the lightweight transport
    pub prefers_browser: bool,

    /// Link names that disqualify an entry
    pub invalid_names: &'static [&'static str],

    /// URL path fragments that disqualify an entry (category pages, blogs)
    pub invalid_path_fragments: &'static [&'static str],
}

impl PlatformSpec {
    /// URL of the zero-based `page`th list page.
    pub fn list_url(&self, page: u32) -> String {
        let base = format!("{}{}", self.base_url, self.list_path);
        match (self.page_param, page) {
            (_, 0) | (None, _) => base,
            (Some(param), n) => {
                let sep = if self.list_path.contains('?') { '&' } else { '?' };
                format!("{}{}{}={}", base, sep, param, n + 1)
            }
        }
    }

    /// True when this platform paginates its listing.
    pub fn is_paginated(&self) -> bool {
        self.page_param.is_some()
    }
}

static SPECS: [PlatformSpec; 5] = [
    PlatformSpec {
        platform: Platform::Itch,
        base_url: "https://itch.io",
        list_path: "/games/new-and-popular/featured/free/platform-web",
        page_param: Some("page"),
        list_strategies: &[
            ListStrategy::Selector {
                selector: r#"a.title.game_link[data-action="game_grid"]"#,
                name: NameSource::Text,
            },
            ListStrategy::Selector {
                selector: "a.game_link",
                name: NameSource::Text,
            },
        ],
        detail_strategies: &[
            DetailStrategy::ElementAttr {
                selector: "iframe",
                attrs: &["src"],
                must_contain: Some("itch.zone"),
            },
            DetailStrategy::BodyRegex {
                pattern: r#"https://html-classic\.itch\.zone/html/\d+/[^/\s"'&]+/index\.html"#,
                group: 0,
            },
            DetailStrategy::BodyRegex {
                pattern: r#""(?:play_url|embed_url|game_url)"\s*:\s*"([^"]*itch\.zone[^"]*)""#,
                group: 1,
            },
        ],
        detail_field: DetailField::Iframe,
        marker: Some("itch.io"),
        prefers_browser: false,
        invalid_names: INVALID_NAMES,
        invalid_path_fragments: &[
            "/jam/",
            "/community/",
            "/blog/",
            "/devlog/",
            "/profile/",
            "/collection/",
            "/bundle/",
        ],
    },
    PlatformSpec {
        platform: Platform::AzGames,
        base_url: "https://azgames.io",
        list_path: "/new-games",
        page_param: Some("page"),
        list_strategies: &[
            ListStrategy::Selector {
                selector: ".us-grid-game a.us-game-link",
                name: NameSource::ImgTitleOrAlt,
            },
            ListStrategy::Selector {
                selector: "a.us-game-link",
                name: NameSource::ChildText("span.text-overflow"),
            },
        ],
        detail_strategies: &[
            // The embed address lives in an HTML comment on current pages
            DetailStrategy::BodyRegex {
                pattern: r#"https://azgames\.io/[^<>\s"']+\.embed"#,
                group: 0,
            },
            DetailStrategy::ElementAttr {
                selector: "iframe, embed, object",
                attrs: &["src", "data"],
                must_contain: Some(".embed"),
            },
            DetailStrategy::BodyRegex {
                pattern: r#"["']([^"']+\.embed)["']"#,
                group: 1,
            },
            DetailStrategy::EmbedSuffix { suffix: ".embed" },
        ],
        detail_field: DetailField::Embed,
        marker: Some("azgames"),
        prefers_browser: false,
        invalid_names: INVALID_NAMES,
        invalid_path_fragments: &[
            "/category/", "/tag/", "/search", "/user/", "/about", "/contact", "/privacy",
            "/terms", "/upload/", "/static/",
        ],
    },
    PlatformSpec {
        platform: Platform::ArmorGames,
        base_url: "https://armorgames.com",
        list_path: "/games/date",
        page_param: Some("page"),
        list_strategies: &[
            ListStrategy::Selector {
                selector: "ul.gamelisting li a[href]",
                name: NameSource::Text,
            },
            ListStrategy::HrefContains { fragment: "/play/" },
        ],
        detail_strategies: &[
            DetailStrategy::ElementAttr {
                selector: "iframe#html-game-frame",
                attrs: &["data-src", "src"],
                must_contain: None,
            },
            DetailStrategy::ElementAttr {
                selector: "iframe",
                attrs: &["data-src", "src"],
                must_contain: Some("armorgames.com"),
            },
            DetailStrategy::BodyRegex {
                pattern: r#"(https://\d+\.cache\.armorgames\.com/files/games/[^"'\s]+)"#,
                group: 1,
            },
        ],
        detail_field: DetailField::Embed,
        marker: Some("armorgames"),
        prefers_browser: false,
        invalid_names: INVALID_NAMES,
        invalid_path_fragments: &["/category/", "/community", "/forums", "/user/"],
    },
    PlatformSpec {
        platform: Platform::GameFlare,
        base_url: "https://www.gameflare.com",
        list_path: "/new-games/",
        page_param: Some("page"),
        list_strategies: &[
            ListStrategy::Selector {
                selector: r#"a[href*="/online-game/"]"#,
                name: NameSource::Text,
            },
            ListStrategy::HrefContains {
                fragment: "/online-game/",
            },
        ],
        detail_strategies: &[
            DetailStrategy::ElementAttr {
                selector: "#iframe-in-game",
                attrs: &["src"],
                must_contain: None,
            },
            DetailStrategy::ElementAttr {
                selector: "iframe",
                attrs: &["src"],
                must_contain: Some("gameflare.com"),
            },
            DetailStrategy::EmbedFromSlug {
                strip_prefix: "/online-game/",
                template: "https://www.gameflare.com/embed/{slug}/",
            },
        ],
        detail_field: DetailField::Embed,
        // List grid and game frame are rendered client-side
        marker: Some("gameflare"),
        prefers_browser: true,
        invalid_names: INVALID_NAMES,
        invalid_path_fragments: &[],
    },
    PlatformSpec {
        platform: Platform::ZapGames,
        base_url: "https://zapgames.io",
        list_path: "/new",
        page_param: None,
        list_strategies: &[
            ListStrategy::Selector {
                selector: "a.GameThumb_gameThumbLinkDesktop__wcir5",
                name: NameSource::ChildText(".GameThumb_gameThumbTitleContainer__J1K4D"),
            },
            ListStrategy::Selector {
                selector: "a.GameThumb_gameThumbLinkDesktop__wcir5",
                name: NameSource::ImgTitleOrAlt,
            },
        ],
        detail_strategies: &[
            DetailStrategy::ElementAttr {
                selector: "iframe",
                attrs: &["src"],
                must_contain: Some(".embed"),
            },
            DetailStrategy::ElementAttr {
                selector: "embed, object",
                attrs: &["src", "data"],
                must_contain: Some(".embed"),
            },
            DetailStrategy::EmbedSuffix { suffix: ".embed" },
        ],
        detail_field: DetailField::Embed,
        marker: Some("zapgames"),
        prefers_browser: false,
        invalid_names: INVALID_NAMES,
        invalid_path_fragments: &[],
    },
];

/// The full platform registry.
pub fn registry() -> &'static [PlatformSpec] {
    &SPECS
}
