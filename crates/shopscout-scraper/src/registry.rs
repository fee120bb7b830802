//! Site id → adapter lookup, built once at startup.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use shopscout_core::{AppConfig, ConfigError, Site};

use crate::adapters::{
    Adapter, AdapterEnv, AmazonAdapter, CromaAdapter, FlipkartAdapter, JioMartAdapter,
};
use crate::session::SessionFactory;

#[derive(Debug, Default)]
pub struct AdapterRegistry {
    adapters: HashMap<String, Adapter>,
    unavailable: BTreeMap<String, String>,
}

impl AdapterRegistry {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds every bundled adapter. An adapter whose construction fails
    /// (typically a missing proxy credential) is left out; the failure is
    /// logged here once and kept for [`AdapterRegistry::unavailable`].
    #[must_use]
    pub fn from_config(config: &AppConfig, sessions: Arc<dyn SessionFactory>) -> Self {
        let deadline = Duration::from_secs(config.adapter_deadline_secs);
        let mut registry = Self::empty();

        for site in Site::ALL {
            let env = AdapterEnv::new(Arc::clone(&sessions), deadline)
                .with_span(tracing::info_span!("adapter", site = site.as_str()));

            match build_adapter(site, config, env) {
                Ok(adapter) => registry.register(adapter),
                Err(e) => {
                    tracing::warn!(site = %site, error = %e, "adapter unavailable");
                    registry.unavailable.insert(site.to_string(), e.to_string());
                }
            }
        }

        tracing::info!(
            registered = registry.adapters.len(),
            unavailable = registry.unavailable.len(),
            "adapter registry ready"
        );
        registry
    }

    /// Adds `adapter` under its own site key, replacing any previous entry.
    pub fn register(&mut self, adapter: Adapter) {
        let key = adapter.site().to_string();
        self.unavailable.remove(&key);
        self.adapters.insert(key, adapter);
    }

    /// Case-insensitive lookup. Unknown ids resolve to `None`.
    #[must_use]
    pub fn resolve(&self, site_id: &str) -> Option<Adapter> {
        self.adapters
            .get(site_id)
            .or_else(|| self.adapters.get(&site_id.trim().to_ascii_lowercase()))
            .cloned()
    }

    /// Registered site keys, sorted.
    #[must_use]
    pub fn sites(&self) -> Vec<String> {
        let mut sites: Vec<String> = self.adapters.keys().cloned().collect();
        sites.sort();
        sites
    }

    /// Sites that failed construction, with the reason.
    #[must_use]
    pub fn unavailable(&self) -> &BTreeMap<String, String> {
        &self.unavailable
    }

    pub(crate) fn adapters(&self) -> impl Iterator<Item = &Adapter> {
        self.adapters.values()
    }
}

fn build_adapter(site: Site, config: &AppConfig, env: AdapterEnv) -> Result<Adapter, ConfigError> {
    Ok(match site {
        Site::Amazon => Adapter::ImageCapable(Arc::new(AmazonAdapter::new(config, env)?)),
        Site::Flipkart => Adapter::ImageCapable(Arc::new(FlipkartAdapter::new(config, env)?)),
        Site::JioMart => Adapter::TextOnly(Arc::new(JioMartAdapter::new(config, env))),
        Site::Croma => Adapter::ImageCapable(Arc::new(CromaAdapter::new(config, env)?)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::test_support::test_config;
    use crate::session::stub::StubSessionFactory;

    fn build(config: &AppConfig) -> AdapterRegistry {
        AdapterRegistry::from_config(config, Arc::new(StubSessionFactory::new()))
    }

    #[test]
    fn from_config_registers_every_site_when_key_present() {
        let registry = build(&test_config());
        assert_eq!(registry.sites(), vec!["amazon", "croma", "flipkart", "jiomart"]);
        assert!(registry.unavailable().is_empty());
    }

    #[test]
    fn from_config_without_key_registers_only_direct_sites() {
        let mut config = test_config();
        config.scraperapi_key = None;
        let registry = build(&config);

        assert_eq!(registry.sites(), vec!["jiomart"]);
        let unavailable: Vec<&str> = registry.unavailable().keys().map(String::as_str).collect();
        assert_eq!(unavailable, vec!["amazon", "croma", "flipkart"]);
        assert!(registry.unavailable()["amazon"].contains("SCRAPERAPI_KEY"));
    }

    #[test]
    fn capability_markers_match_sites() {
        let registry = build(&test_config());
        assert!(!registry.resolve("jiomart").unwrap().supports_image_search());
        for site in ["amazon", "flipkart", "croma"] {
            assert!(registry.resolve(site).unwrap().supports_image_search(), "{site}");
        }
    }

    #[test]
    fn resolve_unknown_site_is_none() {
        let registry = build(&test_config());
        assert!(registry.resolve("unknown-site").is_none());
        assert!(registry.resolve("").is_none());
    }

    #[test]
    fn resolve_ignores_case() {
        let registry = build(&test_config());
        assert_eq!(registry.resolve("Amazon").unwrap().site(), "amazon");
    }

    #[test]
    fn empty_registry_has_no_sites() {
        let registry = AdapterRegistry::empty();
        assert!(registry.sites().is_empty());
        assert!(registry.resolve("amazon").is_none());
    }

    #[test]
    fn register_clears_unavailable_entry() {
        let mut config = test_config();
        config.scraperapi_key = None;
        let mut registry = build(&config);

        let adapter = build(&test_config()).resolve("amazon").unwrap();
        registry.register(adapter);

        assert!(registry.resolve("amazon").is_some());
        assert!(!registry.unavailable().contains_key("amazon"));
    }
}
