//! Fan-out of one search across the requested sites.
//!
//! Each requested site runs in its own task. Results are gathered in request
//! order, so the output is grouped by site in the order the caller asked
//! for. A site that is unknown, fails, times out or panics contributes
//! nothing; the others are unaffected.
//!
//! Site tasks are owned by the search call. Dropping the search future
//! aborts every task still running, and a cancelled adapter closes its open
//! page session on the way out.

use std::collections::HashMap;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use shopscout_core::Product;
use tokio::task::JoinHandle;

use crate::adapters::Adapter;
use crate::rate_limit::PolitenessGate;
use crate::registry::AdapterRegistry;

#[derive(Debug)]
pub struct Aggregator {
    registry: AdapterRegistry,
    gates: HashMap<String, Arc<PolitenessGate>>,
}

impl Aggregator {
    /// Takes ownership of `registry` and creates one politeness gate per
    /// adapter that declares an interval. Gates live as long as the
    /// aggregator, so the interval holds across requests.
    #[must_use]
    pub fn new(registry: AdapterRegistry) -> Self {
        let gates = registry
            .adapters()
            .filter_map(|adapter| {
                adapter.politeness().map(|interval| {
                    (
                        adapter.site().to_string(),
                        Arc::new(PolitenessGate::new(interval)),
                    )
                })
            })
            .collect();
        Self { registry, gates }
    }

    #[must_use]
    pub fn registry(&self) -> &AdapterRegistry {
        &self.registry
    }

    /// Text search across `site_ids`. Never fails; sites that produce
    /// nothing are simply absent from the result.
    pub async fn search(&self, query: &str, site_ids: &[String]) -> Vec<Product> {
        let mut tasks = SiteTasks::with_capacity(site_ids.len());
        for site_id in site_ids {
            let Some(adapter) = self.resolve(site_id) else {
                continue;
            };
            let query = query.to_string();
            tasks.push(self.spawn(adapter, move |adapter| async move {
                adapter.search(&query).await
            }));
        }
        collect_in_order(tasks).await
    }

    /// Image search across `site_ids`. Sites without image capability are
    /// skipped. `image` must outlive this call.
    pub async fn search_by_image(&self, image: &Path, site_ids: &[String]) -> Vec<Product> {
        let mut tasks = SiteTasks::with_capacity(site_ids.len());
        for site_id in site_ids {
            let Some(adapter) = self.resolve(site_id) else {
                continue;
            };
            if !adapter.supports_image_search() {
                tracing::info!(site = adapter.site(), "image search not supported, skipping");
                continue;
            }
            let image = image.to_path_buf();
            tasks.push(self.spawn(adapter, move |adapter| async move {
                adapter.search_by_image(&image).await.unwrap_or_default()
            }));
        }
        collect_in_order(tasks).await
    }

    fn resolve(&self, site_id: &str) -> Option<Adapter> {
        let adapter = self.registry.resolve(site_id);
        if adapter.is_none() {
            tracing::warn!(site = site_id, "unknown or unavailable site, skipping");
        }
        adapter
    }

    fn spawn<F, Fut>(&self, adapter: Adapter, invoke: F) -> (String, JoinHandle<Vec<Product>>)
    where
        F: FnOnce(Adapter) -> Fut + Send + 'static,
        Fut: Future<Output = Vec<Product>> + Send + 'static,
    {
        let site = adapter.site().to_string();
        let gate = self.gates.get(&site).cloned();
        let deadline = adapter.deadline();
        let task_site = site.clone();
        let handle = tokio::spawn(async move {
            match (gate, deadline) {
                (Some(gate), Some(deadline)) => gate
                    .run_within(deadline, invoke(adapter))
                    .await
                    .unwrap_or_else(|| {
                        tracing::warn!(
                            site = %task_site,
                            "politeness wait exceeded the adapter deadline, skipping"
                        );
                        Vec::new()
                    }),
                (Some(gate), None) => gate.run(invoke(adapter)).await,
                (None, _) => invoke(adapter).await,
            }
        });
        (site, handle)
    }
}

/// Per-site task handles in request order. Tasks still running when this is
/// dropped are aborted.
struct SiteTasks(Vec<(String, JoinHandle<Vec<Product>>)>);

impl SiteTasks {
    fn with_capacity(capacity: usize) -> Self {
        Self(Vec::with_capacity(capacity))
    }

    fn push(&mut self, task: (String, JoinHandle<Vec<Product>>)) {
        self.0.push(task);
    }
}

impl Drop for SiteTasks {
    fn drop(&mut self) {
        for (site, handle) in &self.0 {
            if !handle.is_finished() {
                tracing::debug!(site = %site, "search abandoned, aborting adapter task");
                handle.abort();
            }
        }
    }
}

async fn collect_in_order(mut tasks: SiteTasks) -> Vec<Product> {
    let mut products = Vec::new();
    for (site, handle) in &mut tasks.0 {
        match handle.await {
            Ok(found) => {
                tracing::info!(site = %site, count = found.len(), "{site} returned {} results", found.len());
                products.extend(found);
            }
            Err(e) => {
                tracing::warn!(site = %site, error = %e, "adapter task failed");
            }
        }
    }
    products
}

#[cfg(test)]
#[path = "aggregator_test.rs"]
mod tests;
