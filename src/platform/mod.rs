//! Platform registry
//!
//! Each supported listing site is described by a [`PlatformSpec`]: its list
//! URL shape, an ordered set of extraction strategies, and the markers the
//! fetch orchestrator uses to judge whether a lightweight response is
//! sufficient. Adding a platform means adding a spec entry here; no
//! orchestrator or session code changes.

mod specs;
mod strategies;

pub use specs::{registry, PlatformSpec};
pub use strategies::{DetailField, DetailStrategy, ListStrategy, NameSource};

use std::fmt;

/// Identifier for a supported game-listing platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Itch,
    AzGames,
    ArmorGames,
    GameFlare,
    ZapGames,
}

impl Platform {
    /// All registered platforms, in default harvest order.
    pub const ALL: [Platform; 5] = [
        Platform::Itch,
        Platform::AzGames,
        Platform::ArmorGames,
        Platform::GameFlare,
        Platform::ZapGames,
    ];

    /// Stable string identifier, used in config, CLI, and persisted records.
    pub fn id(&self) -> &'static str {
        match self {
            Platform::Itch => "itch.io",
            Platform::AzGames => "azgames.io",
            Platform::ArmorGames => "armorgames.com",
            Platform::GameFlare => "gameflare.com",
            Platform::ZapGames => "zapgames.io",
        }
    }

    /// Parses a platform identifier. Returns None for unknown ids.
    pub fn parse(s: &str) -> Option<Platform> {
        match s {
            "itch.io" => Some(Platform::Itch),
            "azgames.io" => Some(Platform::AzGames),
            "armorgames.com" => Some(Platform::ArmorGames),
            "gameflare.com" => Some(Platform::GameFlare),
            "zapgames.io" => Some(Platform::ZapGames),
            _ => None,
        }
    }

    /// Looks up the registered extraction spec for this platform.
    pub fn spec(&self) -> &'static PlatformSpec {
        registry()
            .iter()
            .find(|spec| spec.platform == *self)
            .expect("every platform has a registered spec")
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}
