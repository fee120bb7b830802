//! Command handlers. Each prints a single JSON document to stdout.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use shopscout_core::{AppConfig, Site};
use shopscout_scraper::{AdapterRegistry, Aggregator, HttpSessionFactory};

pub(crate) fn build_aggregator(config: &AppConfig) -> Aggregator {
    Aggregator::new(AdapterRegistry::from_config(
        config,
        Arc::new(HttpSessionFactory),
    ))
}

pub(crate) async fn run_search(
    aggregator: &Aggregator,
    query: &str,
    sites: Vec<Site>,
    pretty: bool,
) -> anyhow::Result<()> {
    let query = query.trim();
    if query.is_empty() {
        anyhow::bail!("query must not be blank");
    }
    let sites = sites_or_all(sites);
    let products = aggregator.search(query, &sites).await;
    tracing::info!(query, results = products.len(), "text search complete");
    println!("{}", render_json(&products, pretty)?);
    Ok(())
}

/// # Errors
///
/// Returns an error if `path` is not a readable file.
pub(crate) async fn run_image_search(
    aggregator: &Aggregator,
    path: &Path,
    sites: Vec<Site>,
    pretty: bool,
) -> anyhow::Result<()> {
    if !path.is_file() {
        anyhow::bail!("image '{}' does not exist or is not a file", path.display());
    }
    let sites = sites_or_all(sites);
    let products = aggregator.search_by_image(path, &sites).await;
    tracing::info!(
        image = %path.display(),
        results = products.len(),
        "image search complete"
    );
    println!("{}", render_json(&products, pretty)?);
    Ok(())
}

#[derive(Debug, Serialize)]
struct SitesReport<'a> {
    sites: Vec<String>,
    unavailable: &'a BTreeMap<String, String>,
}

pub(crate) fn run_sites(aggregator: &Aggregator, pretty: bool) -> anyhow::Result<()> {
    let registry = aggregator.registry();
    let report = SitesReport {
        sites: registry.sites(),
        unavailable: registry.unavailable(),
    };
    println!("{}", render_json(&report, pretty)?);
    Ok(())
}

fn sites_or_all(sites: Vec<Site>) -> Vec<String> {
    let sites = if sites.is_empty() {
        Site::ALL.to_vec()
    } else {
        sites
    };
    sites.iter().map(ToString::to_string).collect()
}

fn render_json<T: Serialize>(value: &T, pretty: bool) -> serde_json::Result<String> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}
