//! jiomart.com adapter. Text search only.
//!
//! Listings are localized by delivery pincode, which the storefront reads
//! from the `custPincode` cookie; the cookie is set after loading the home
//! page so it lands on the right domain. Traffic goes direct, not through
//! the proxy.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use shopscout_core::{AppConfig, Product};

use super::{AdapterEnv, SessionRunner, SiteAdapter};
use crate::error::SessionError;
use crate::normalize::{extract_products, CardSchema, CardSelectors, UnknownPrice};
use crate::parse::encode_query;
use crate::session::{BrowserProfile, PageSession, SessionConfig};

const SITE: &str = "jiomart";
const ORIGIN: &str = "https://www.jiomart.com";
const PINCODE_COOKIE: &str = "custPincode";
const LOCATION_MODAL_CLOSE: &str = "button[data-testid='closeIcon']";
const RESULTS_LIST: &str = "ol.ais-InfiniteHits-list";
const RESULT_CARD: &str = "li.ais-InfiniteHits-item";
const MAX_RESULTS: usize = 40;
const MODAL_WAIT: Duration = Duration::from_secs(5);
const RESULTS_WAIT: Duration = Duration::from_secs(20);

const SCHEMA: CardSchema = CardSchema {
    site: SITE,
    origin: ORIGIN,
    selectors: CardSelectors {
        title: "div.plp-card-details-name",
        link: "a",
        image: "img",
        price: "div.plp-card-details-price span",
    },
    unknown_price: UnknownPrice::Absent,
};

pub struct JioMartAdapter {
    runner: SessionRunner,
    pincode: String,
}

impl JioMartAdapter {
    #[must_use]
    pub fn new(config: &AppConfig, env: AdapterEnv) -> Self {
        let session_config = SessionConfig {
            proxy: None,
            profile: BrowserProfile::new(randomized_mobile_user_agent()),
            page_load_timeout: Duration::from_secs(config.session_timeout_secs),
        };
        Self {
            runner: SessionRunner::new(SITE, env, session_config),
            pincode: config.jiomart_pincode.clone(),
        }
    }
}

#[async_trait]
impl SiteAdapter for JioMartAdapter {
    fn site(&self) -> &str {
        SITE
    }

    fn deadline(&self) -> Option<Duration> {
        Some(self.runner.deadline())
    }

    async fn search(&self, query: &str) -> Vec<Product> {
        let url = format!("{ORIGIN}/search?q={}", encode_query(query));
        let pincode = self.pincode.clone();
        self.runner
            .run("search", query, move |session| {
                Box::pin(scrape_search(session, url, pincode))
            })
            .await
    }
}

async fn scrape_search(
    session: &mut Box<dyn PageSession>,
    url: String,
    pincode: String,
) -> Result<Vec<Product>, SessionError> {
    session.navigate(&format!("{ORIGIN}/")).await?;
    session.set_cookie(PINCODE_COOKIE, &pincode).await?;
    session.navigate(&url).await?;

    // The location modal only shows for some sessions.
    if let Err(e) = session.click(LOCATION_MODAL_CLOSE, MODAL_WAIT).await {
        tracing::debug!(error = %e, "location modal not dismissed");
    }

    let list = session.wait_for_selector(RESULTS_LIST, RESULTS_WAIT).await?;
    let mut cards = list.find_all(RESULT_CARD)?;
    cards.truncate(MAX_RESULTS);

    Ok(extract_products(&SCHEMA, &cards))
}

/// Android Chrome user agent with a random device model and Chrome major
/// version, picked once per adapter.
fn randomized_mobile_user_agent() -> String {
    let mut rng = rand::rng();
    let model: u16 = rng.random_range(100..=999);
    let chrome: u16 = rng.random_range(118..=136);
    format!(
        "Mozilla/5.0 (Linux; Android 10; SM-{model}F) AppleWebKit/537.36 \
         (KHTML, like Gecko) Chrome/{chrome}.0.0.0 Mobile Safari/537.36"
    )
}

#[cfg(test)]
#[path = "jiomart_test.rs"]
mod tests;
