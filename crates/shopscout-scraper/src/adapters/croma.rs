//! croma.com adapter.
//!
//! Croma throttles aggressively, so the adapter declares a politeness
//! interval for the aggregator to enforce between consecutive searches.
//! Image search falls back to a text search on the image file's name.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use shopscout_core::{AppConfig, ConfigError, Product};

use super::{
    scraperapi_proxy, AdapterEnv, ImageSearch, SessionRunner, SiteAdapter, MOBILE_CHROME_UA,
};
use crate::error::SessionError;
use crate::normalize::{extract_products, CardSchema, CardSelectors, UnknownPrice};
use crate::parse::{encode_query, image_keywords};
use crate::session::{BrowserProfile, PageSession, SessionConfig};

const SITE: &str = "croma";
const ORIGIN: &str = "https://www.croma.com";
const RESULT_CARD: &str = "li.product-item";
const MAX_RESULTS: usize = 10;
const RESULTS_WAIT: Duration = Duration::from_secs(20);

const SCHEMA: CardSchema = CardSchema {
    site: SITE,
    origin: ORIGIN,
    selectors: CardSelectors {
        title: "h3.product-title",
        link: "a.product-title",
        image: "img",
        price: "span.new-price",
    },
    unknown_price: UnknownPrice::Zero,
};

pub struct CromaAdapter {
    runner: SessionRunner,
    politeness: Option<Duration>,
}

impl CromaAdapter {
    /// A `croma_politeness_ms` of zero disables throttling.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] when `SCRAPERAPI_KEY` is unset.
    pub fn new(config: &AppConfig, env: AdapterEnv) -> Result<Self, ConfigError> {
        let session_config = SessionConfig {
            proxy: Some(scraperapi_proxy(config)?),
            profile: BrowserProfile::new(MOBILE_CHROME_UA),
            page_load_timeout: Duration::from_secs(config.session_timeout_secs),
        };
        let politeness =
            Some(Duration::from_millis(config.croma_politeness_ms)).filter(|d| !d.is_zero());
        Ok(Self {
            runner: SessionRunner::new(SITE, env, session_config),
            politeness,
        })
    }
}

#[async_trait]
impl SiteAdapter for CromaAdapter {
    fn site(&self) -> &str {
        SITE
    }

    fn deadline(&self) -> Option<Duration> {
        Some(self.runner.deadline())
    }

    fn politeness(&self) -> Option<Duration> {
        self.politeness
    }

    async fn search(&self, query: &str) -> Vec<Product> {
        let url = format!("{ORIGIN}/searchB?q={}", encode_query(query));
        self.runner
            .run("search", query, move |session| {
                Box::pin(scrape_search(session, url))
            })
            .await
    }
}

#[async_trait]
impl ImageSearch for CromaAdapter {
    async fn search_by_image(&self, image: &Path) -> Vec<Product> {
        let Some(keywords) = image_keywords(image) else {
            tracing::warn!(site = SITE, image = %image.display(), "image file name has no usable keywords");
            return Vec::new();
        };
        self.search(&keywords).await
    }
}

async fn scrape_search(
    session: &mut Box<dyn PageSession>,
    url: String,
) -> Result<Vec<Product>, SessionError> {
    session.navigate(&url).await?;
    session.wait_for_selector(RESULT_CARD, RESULTS_WAIT).await?;

    let mut cards = session.find_all(RESULT_CARD).await?;
    cards.truncate(MAX_RESULTS);

    Ok(extract_products(&SCHEMA, &cards))
}
