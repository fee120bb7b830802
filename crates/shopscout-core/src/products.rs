use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Stock status reported for a search result.
///
/// Result listings expose no structured stock data, so every adapter reports
/// [`Availability::InStock`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Availability {
    #[default]
    InStock,
}

/// A single search result, normalized across storefronts.
///
/// Field names on the wire follow the front-end contract: `review_count` is
/// serialized as `reviews` and `detail_url` as `url`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// `"{site}-{hash}"`, see [`product_id`]. Scoped to one response; two
    /// listings with the same title on one site share an id.
    pub id: String,
    pub name: String,
    /// Listed price in the storefront's currency. `None` when the adapter
    /// reports unparseable prices as absent rather than zero.
    pub price: Option<f64>,
    /// Always `0.0`: no adapter extracts ratings from result cards.
    pub rating: f64,
    /// Always `0`: no adapter extracts review counts from result cards.
    #[serde(rename = "reviews")]
    pub review_count: u32,
    /// Absolute URL of the listing thumbnail.
    pub image_url: String,
    /// Absolute URL of the product page.
    #[serde(rename = "url")]
    pub detail_url: String,
    /// Registry key of the adapter that produced this record (e.g. `"amazon"`).
    pub site: String,
    pub availability: Availability,
}

impl Product {
    /// Returns `true` when the identity fields every emitted record must carry
    /// are present and the price, if any, is a non-negative number.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        !self.name.trim().is_empty()
            && !self.detail_url.trim().is_empty()
            && !self.site.trim().is_empty()
            && self.price.is_none_or(|p| p.is_finite() && p >= 0.0)
    }
}

/// Derives a product id from the site key and listing title.
///
/// The hash is SHA-256 over `site`, a NUL separator, and `title`, truncated to
/// 16 hex characters. The result is stable across processes but not unique:
/// identical titles on one site collide.
#[must_use]
pub fn product_id(site: &str, title: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(site.as_bytes());
    hasher.update([0u8]);
    hasher.update(title.as_bytes());
    let digest = hasher.finalize();
    let hex: String = digest.iter().take(8).map(|b| format!("{b:02x}")).collect();
    format!("{site}-{hex}")
}
