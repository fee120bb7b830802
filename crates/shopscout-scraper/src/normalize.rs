//! Conversion from rendered result cards to [`shopscout_core::Product`].
//!
//! Every storefront lays its cards out differently, but the extraction rules
//! are shared: title, link and image are mandatory, price falls back to the
//! adapter's [`UnknownPrice`] policy, and rating/reviews are not read from
//! listings at all.

use shopscout_core::{product_id, Availability, Product};

use crate::dom::Element;
use crate::error::ExtractError;
use crate::parse::{absolutize_url, parse_price};

/// What an adapter reports when a card's price text does not parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnknownPrice {
    /// Emit `price: None` (serialized as `null`).
    Absent,
    /// Emit `price: Some(0.0)`.
    Zero,
}

impl UnknownPrice {
    #[must_use]
    pub fn resolve(self, parsed: Option<f64>) -> Option<f64> {
        match (parsed, self) {
            (Some(price), _) => Some(price),
            (None, UnknownPrice::Absent) => None,
            (None, UnknownPrice::Zero) => Some(0.0),
        }
    }
}

/// CSS selectors evaluated relative to a single result card.
#[derive(Debug, Clone, Copy)]
pub struct CardSelectors {
    pub title: &'static str,
    pub link: &'static str,
    pub image: &'static str,
    pub price: &'static str,
}

/// Everything needed to turn one site's cards into products.
#[derive(Debug, Clone, Copy)]
pub struct CardSchema {
    pub site: &'static str,
    /// Scheme and host that relative `href`/`src` values resolve against.
    pub origin: &'static str,
    pub selectors: CardSelectors,
    pub unknown_price: UnknownPrice,
}

/// Extracts one product from a result card.
///
/// # Errors
///
/// Returns [`ExtractError::MissingField`] when the card has no usable title,
/// detail link, or image URL.
pub fn extract_product(schema: &CardSchema, card: &Element) -> Result<Product, ExtractError> {
    let sel = &schema.selectors;

    let name = first(card, sel.title)
        .map(|el| el.text())
        .filter(|t| !t.is_empty())
        .ok_or(ExtractError::MissingField { field: "title" })?;

    let detail_url = first(card, sel.link)
        .and_then(|el| el.attr("href"))
        .and_then(|href| absolutize_url(schema.origin, &href))
        .ok_or(ExtractError::MissingField { field: "link" })?;

    let image_url = first(card, sel.image)
        .and_then(|el| el.attr("src"))
        .and_then(|src| absolutize_url(schema.origin, &src))
        .ok_or(ExtractError::MissingField { field: "image" })?;

    let parsed = first(card, sel.price).and_then(|el| parse_price(&el.text()));

    Ok(Product {
        id: product_id(schema.site, &name),
        name,
        price: schema.unknown_price.resolve(parsed),
        rating: 0.0,
        review_count: 0,
        image_url,
        detail_url,
        site: schema.site.to_string(),
        availability: Availability::InStock,
    })
}

/// Extracts products from `cards` in order, dropping cards that are missing a
/// required field.
#[must_use]
pub fn extract_products(schema: &CardSchema, cards: &[Element]) -> Vec<Product> {
    cards
        .iter()
        .enumerate()
        .filter_map(|(index, card)| match extract_product(schema, card) {
            Ok(product) => Some(product),
            Err(e) => {
                tracing::debug!(site = schema.site, index, error = %e, "skipping result card");
                None
            }
        })
        .collect()
}

// Static selectors never fail to parse; a lookup error is treated the same as
// no match.
fn first(card: &Element, css: &str) -> Option<Element> {
    card.find(css).ok().flatten()
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
