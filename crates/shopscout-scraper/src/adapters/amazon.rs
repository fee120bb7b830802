//! amazon.in adapter.
//!
//! Text search loads the results page directly. Image search drives the
//! storefront's camera widget: open the home page, click the camera button,
//! hand the file to the upload input and wait for the results slot.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use shopscout_core::{AppConfig, ConfigError, Product};

use super::{
    scraperapi_proxy, AdapterEnv, ImageSearch, SessionRunner, SiteAdapter, MOBILE_CHROME_UA,
};
use crate::error::SessionError;
use crate::normalize::{extract_products, CardSchema, CardSelectors, UnknownPrice};
use crate::parse::encode_query;
use crate::session::{BrowserProfile, PageSession, SessionConfig};

const SITE: &str = "amazon";
const ORIGIN: &str = "https://www.amazon.in";
const RESULTS_MARKER: &str = "div.s-main-slot";
const RESULT_CARD: &str = ".s-result-item.s-asin";
const FILE_INPUT: &str = "input[type='file']";
/// The camera button has lived in two places in the header markup.
const CAMERA_BUTTONS: [&str; 2] = [
    "div#nav-search-submit-button + div[data-action='show-image-search'] button",
    "div#nav-search-scope button[data-action='show-image-search']",
];

const MAX_RESULTS: usize = 10;
const SEARCH_WAIT: Duration = Duration::from_secs(15);
const CAMERA_WAIT: Duration = Duration::from_secs(15);
const CAMERA_SETTLE: Duration = Duration::from_secs(2);
const IMAGE_RESULTS_WAIT: Duration = Duration::from_secs(20);

const SCHEMA: CardSchema = CardSchema {
    site: SITE,
    origin: ORIGIN,
    selectors: CardSelectors {
        title: "a h2 span",
        link: "a",
        image: "img",
        price: ".a-price-whole",
    },
    unknown_price: UnknownPrice::Absent,
};

pub struct AmazonAdapter {
    runner: SessionRunner,
    camera_settle: Duration,
}

impl AmazonAdapter {
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
            camera_settle: CAMERA_SETTLE,
        })
    }
}

#[async_trait]
impl SiteAdapter for AmazonAdapter {
    fn site(&self) -> &str {
        SITE
    }

    fn deadline(&self) -> Option<Duration> {
        Some(self.runner.deadline())
    }

    async fn search(&self, query: &str) -> Vec<Product> {
        let url = format!("{ORIGIN}/s?k={}", encode_query(query));
        self.runner
            .run("search", query, move |session| {
                Box::pin(scrape_search(session, url))
            })
            .await
    }
}

#[async_trait]
impl ImageSearch for AmazonAdapter {
    async fn search_by_image(&self, image: &Path) -> Vec<Product> {
        let image = image.to_path_buf();
        let subject = image.display().to_string();
        let settle = self.camera_settle;
        self.runner
            .run("image_search", &subject, move |session| {
                Box::pin(scrape_image_search(session, image, settle))
            })
            .await
    }
}

async fn scrape_search(
    session: &mut Box<dyn PageSession>,
    url: String,
) -> Result<Vec<Product>, SessionError> {
    session.navigate(&url).await?;
    collect_results(session, SEARCH_WAIT).await
}

async fn scrape_image_search(
    session: &mut Box<dyn PageSession>,
    image: PathBuf,
    settle: Duration,
) -> Result<Vec<Product>, SessionError> {
    session.navigate(ORIGIN).await?;
    click_camera(session).await?;
    tokio::time::sleep(settle).await;
    session.upload_file(FILE_INPUT, &image).await?;
    collect_results(session, IMAGE_RESULTS_WAIT).await
}

async fn click_camera(session: &mut Box<dyn PageSession>) -> Result<(), SessionError> {
    for selector in CAMERA_BUTTONS {
        match session.click(selector, CAMERA_WAIT).await {
            Ok(()) => return Ok(()),
            Err(e) => tracing::debug!(selector, error = %e, "camera button candidate not usable"),
        }
    }
    Err(SessionError::NoSuchElement {
        selector: "camera button".to_string(),
    })
}

async fn collect_results(
    session: &mut Box<dyn PageSession>,
    wait: Duration,
) -> Result<Vec<Product>, SessionError> {
    let slot = session.wait_for_selector(RESULTS_MARKER, wait).await?;
    let cards = slot.find_all(RESULT_CARD)?;
    let cards = &cards[..cards.len().min(MAX_RESULTS)];
    Ok(extract_products(&SCHEMA, cards))
}

#[cfg(test)]
#[path = "amazon_test.rs"]
mod tests;
