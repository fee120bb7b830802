use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Storefronts with a built-in adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Site {
    Amazon,
    Flipkart,
    #[serde(rename = "jiomart")]
    JioMart,
    Croma,
}

impl Site {
    pub const ALL: [Site; 4] = [Site::Amazon, Site::Flipkart, Site::JioMart, Site::Croma];

    /// Registry key used on the wire (`sites=amazon`).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Site::Amazon => "amazon",
            Site::Flipkart => "flipkart",
            Site::JioMart => "jiomart",
            Site::Croma => "croma",
        }
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown site: {0}")]
pub struct UnknownSite(pub String);

impl FromStr for Site {
    type Err = UnknownSite;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Site::ALL
            .into_iter()
            .find(|site| site.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownSite(s.to_string()))
    }
}
