//! Field-level parsing shared by every adapter.

use std::sync::LazyLock;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regex::Regex;

/// A run of digits with its thousands separators (both `1,234` and
/// lakh-style `1,23,456`) and decimal point.
static NUMBER_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d[\d,.]*").expect("valid regex"));

/// RFC 3986 unreserved characters stay as they are; everything else,
/// space included, is percent-encoded.
const QUERY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Parses a displayed price such as `"₹1,23,456.70"` or `"1,299."`.
///
/// Returns `None` when the text holds no number, more than one number
/// (`"₹499 - ₹999"`), a number that is not a single decimal (`"1.2.3"`), or
/// a value that is negative or not finite.
#[must_use]
pub fn parse_price(raw: &str) -> Option<f64> {
    let mut runs = NUMBER_RUN_RE.find_iter(raw);
    let number = runs.next()?.as_str();
    if runs.next().is_some() {
        return None;
    }
    // Trailing dots come from split whole/fraction markup.
    let cleaned = number.replace(',', "");
    cleaned
        .trim_end_matches('.')
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
}

/// Percent-encodes a free-text query for use in a search URL. Spaces become
/// `%20`, not `+`.
#[must_use]
pub fn encode_query(query: &str) -> String {
    utf8_percent_encode(query.trim(), QUERY_ENCODE_SET).to_string()
}

/// Resolves `href`/`src` values against the storefront origin.
///
/// Absolute URLs pass through unchanged; protocol-relative URLs get
/// `https:`. Returns `None` for empty values, `javascript:` links, and
/// anything that does not resolve to an http(s) URL.
#[must_use]
pub fn absolutize_url(origin: &str, raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() || raw.starts_with('#') {
        return None;
    }
    let base = reqwest::Url::parse(origin).ok()?;
    let resolved = base.join(raw).ok()?;
    match resolved.scheme() {
        "http" | "https" => Some(resolved.to_string()),
        _ => None,
    }
}

/// Returns the image file's stem as a text query (`/tmp/red shoes.jpg` →
/// `"red shoes"`). Used by adapters without a real image search.
#[must_use]
pub fn image_keywords(path: &std::path::Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    let words: Vec<&str> = stem
        .split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .collect();
    if words.is_empty() {
        None
    } else {
        Some(words.join(" "))
    }
}

#[cfg(test)]
#[path = "parse_test.rs"]
mod tests;
