//! flipkart.com adapter.
//!
//! Listings render as rows inside the last results container; the first row
//! and the last two rows are filters and pagination, not products. Image
//! search falls back to a text search on the image file's name.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use shopscout_core::{AppConfig, ConfigError, Product};

use super::{
    inner_rows, scraperapi_proxy, AdapterEnv, ImageSearch, SessionRunner, SiteAdapter,
    MOBILE_CHROME_UA,
};
use crate::dom::Element;
use crate::error::SessionError;
use crate::normalize::{extract_products, CardSchema, CardSelectors, UnknownPrice};
use crate::parse::{encode_query, image_keywords};
use crate::session::{BrowserProfile, PageSession, SessionConfig};

const SITE: &str = "flipkart";
const ORIGIN: &str = "https://www.flipkart.com";
const RESULTS_CONTAINER: &str = "div.DOjaWF.gdgoEp";
const RESULT_ROW: &str = "div.cPHDOP";
const RESULT_CARD: &str = "div._75nlfW > div";
const MAX_RESULTS: usize = 10;
const RESULTS_WAIT: Duration = Duration::from_secs(15);

const SCHEMA: CardSchema = CardSchema {
    site: SITE,
    origin: ORIGIN,
    selectors: CardSelectors {
        title: "div.KzDlHZ",
        link: "a.CGtC98",
        image: "img",
        price: "div.Nx9bqj",
    },
    unknown_price: UnknownPrice::Zero,
};

pub struct FlipkartAdapter {
    runner: SessionRunner,
}

impl FlipkartAdapter {
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] when `SCRAPERAPI_KEY` is unset.
    pub fn new(config: &AppConfig, env: AdapterEnv) -> Result<Self, ConfigError> {
        let session_config = SessionConfig {
            proxy: Some(scraperapi_proxy(config)?),
            profile: BrowserProfile::new(MOBILE_CHROME_UA),
            page_load_timeout: Duration::from_secs(config.session_timeout_secs),
        };
        Ok(Self {
            runner: SessionRunner::new(SITE, env, session_config),
        })
    }
}

#[async_trait]
impl SiteAdapter for FlipkartAdapter {
    fn site(&self) -> &str {
        SITE
    }

    fn deadline(&self) -> Option<Duration> {
        Some(self.runner.deadline())
    }

    async fn search(&self, query: &str) -> Vec<Product> {
        let url = format!("{ORIGIN}/search?q={}", encode_query(query));
        self.runner
            .run("search", query, move |session| {
                Box::pin(scrape_search(session, url))
            })
            .await
    }
}

#[async_trait]
impl ImageSearch for FlipkartAdapter {
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
    session
        .wait_for_selector(RESULTS_CONTAINER, RESULTS_WAIT)
        .await?;

    let containers = session.find_all(RESULTS_CONTAINER).await?;
    let Some(container) = containers.last() else {
        return Ok(Vec::new());
    };

    let rows = container.find_all(RESULT_ROW)?;
    let mut cards: Vec<Element> = Vec::new();
    for row in inner_rows(&rows) {
        cards.extend(row.find_all(RESULT_CARD)?);
    }
    cards.truncate(MAX_RESULTS);

    Ok(extract_products(&SCHEMA, &cards))
}

#[cfg(test)]
#[path = "flipkart_test.rs"]
mod tests;
