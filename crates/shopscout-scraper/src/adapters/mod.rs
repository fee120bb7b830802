//! Storefront adapters and the capability contract they implement.
//!
//! Every adapter turns a query into a list of [`Product`]s and never fails
//! past its boundary: session errors, render timeouts and deadline expiry are
//! logged and reported as an empty list.

pub mod amazon;
pub mod croma;
pub mod flipkart;
pub mod jiomart;

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::future::BoxFuture;
use shopscout_core::{AppConfig, ConfigError, Product};
use tracing::Instrument;

use crate::session::{PageSession, ProxyConfig, SessionConfig, SessionFactory};

pub use amazon::AmazonAdapter;
pub use croma::CromaAdapter;
pub use flipkart::FlipkartAdapter;
pub use jiomart::JioMartAdapter;

/// Upper bound on `close` after the scrape itself has finished or expired.
const CLOSE_GRACE: Duration = Duration::from_secs(5);

/// Android Chrome profile shared by the proxied adapters.
pub(crate) const MOBILE_CHROME_UA: &str = "Mozilla/5.0 (Linux; Android 6.0; Nexus 5 Build/MRA58N) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/136.0.0.0 Mobile Safari/537.36";

#[async_trait]
pub trait SiteAdapter: Send + Sync {
    /// Registry key, e.g. `"amazon"`.
    fn site(&self) -> &str;

    /// Minimum interval between the end of one invocation and the start of
    /// the next against this site.
    fn politeness(&self) -> Option<Duration> {
        None
    }

    /// Wall-clock bound on one invocation. A politeness wait longer than this
    /// skips the invocation. `None` waits as long as it takes.
    fn deadline(&self) -> Option<Duration> {
        None
    }

    async fn search(&self, query: &str) -> Vec<Product>;
}

/// Adapters that can answer a search from an image file.
#[async_trait]
pub trait ImageSearch: SiteAdapter {
    async fn search_by_image(&self, image: &Path) -> Vec<Product>;
}

/// A registered adapter tagged with what it can do.
#[derive(Clone)]
pub enum Adapter {
    TextOnly(Arc<dyn SiteAdapter>),
    ImageCapable(Arc<dyn ImageSearch>),
}

impl Adapter {
    #[must_use]
    pub fn site(&self) -> &str {
        match self {
            Adapter::TextOnly(a) => a.site(),
            Adapter::ImageCapable(a) => a.site(),
        }
    }

    #[must_use]
    pub fn politeness(&self) -> Option<Duration> {
        match self {
            Adapter::TextOnly(a) => a.politeness(),
            Adapter::ImageCapable(a) => a.politeness(),
        }
    }

    #[must_use]
    pub fn deadline(&self) -> Option<Duration> {
        match self {
            Adapter::TextOnly(a) => a.deadline(),
            Adapter::ImageCapable(a) => a.deadline(),
        }
    }

    #[must_use]
    pub fn supports_image_search(&self) -> bool {
        matches!(self, Adapter::ImageCapable(_))
    }

    pub async fn search(&self, query: &str) -> Vec<Product> {
        match self {
            Adapter::TextOnly(a) => a.search(query).await,
            Adapter::ImageCapable(a) => a.search(query).await,
        }
    }

    /// `None` when the adapter has no image capability.
    pub async fn search_by_image(&self, image: &Path) -> Option<Vec<Product>> {
        match self {
            Adapter::TextOnly(_) => None,
            Adapter::ImageCapable(a) => Some(a.search_by_image(image).await),
        }
    }
}

impl fmt::Debug for Adapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Adapter::TextOnly(_) => "TextOnly",
            Adapter::ImageCapable(_) => "ImageCapable",
        };
        f.debug_tuple(kind).field(&self.site()).finish()
    }
}

/// Runtime dependencies handed to every bundled adapter.
#[derive(Clone)]
pub struct AdapterEnv {
    pub sessions: Arc<dyn SessionFactory>,
    /// Wall-clock bound on one invocation, session acquisition included.
    pub deadline: Duration,
    /// Span all of the adapter's log events are recorded under.
    pub span: tracing::Span,
}

impl AdapterEnv {
    #[must_use]
    pub fn new(sessions: Arc<dyn SessionFactory>, deadline: Duration) -> Self {
        Self {
            sessions,
            deadline,
            span: tracing::Span::none(),
        }
    }

    #[must_use]
    pub fn with_span(mut self, span: tracing::Span) -> Self {
        self.span = span;
        self
    }
}

/// ScraperAPI forward proxy built from `SCRAPERAPI_KEY`.
///
/// # Errors
///
/// Returns [`ConfigError::MissingEnvVar`] when no key is configured.
pub(crate) fn scraperapi_proxy(config: &AppConfig) -> Result<ProxyConfig, ConfigError> {
    let key = config
        .scraperapi_key
        .as_deref()
        .ok_or_else(|| ConfigError::MissingEnvVar("SCRAPERAPI_KEY".to_string()))?;
    Ok(ProxyConfig::new(
        config.proxy_host.as_str(),
        config.proxy_port,
        "scraperapi",
        key,
    ))
}

pub(crate) type ScrapeFuture<'s> =
    BoxFuture<'s, Result<Vec<Product>, crate::error::SessionError>>;

/// Owns one adapter's session settings and runs scrapes inside the
/// open / deadline / close envelope.
pub(crate) struct SessionRunner {
    site: &'static str,
    sessions: Arc<dyn SessionFactory>,
    session_config: SessionConfig,
    deadline: Duration,
    span: tracing::Span,
}

impl SessionRunner {
    pub(crate) fn new(site: &'static str, env: AdapterEnv, session_config: SessionConfig) -> Self {
        Self {
            site,
            sessions: env.sessions,
            session_config,
            deadline: env.deadline,
            span: env.span,
        }
    }

    pub(crate) fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Opens a session, runs `scrape` against it and closes it on every exit
    /// path. Any failure yields an empty list.
    pub(crate) async fn run<F>(&self, action: &'static str, subject: &str, scrape: F) -> Vec<Product>
    where
        F: for<'s> FnOnce(&'s mut Box<dyn PageSession>) -> ScrapeFuture<'s> + Send,
    {
        let site = self.site;
        let deadline_secs = self.deadline.as_secs();

        async move {
            let started = Instant::now();

            let session =
                match tokio::time::timeout(self.deadline, self.sessions.open(&self.session_config))
                    .await
                {
                    Ok(Ok(session)) => session,
                    Ok(Err(e)) => {
                        tracing::warn!(site, action, subject, error = %e, "failed to open page session");
                        return Vec::new();
                    }
                    Err(_) => {
                        tracing::warn!(site, action, subject, deadline_secs, "deadline elapsed opening page session");
                        return Vec::new();
                    }
                };
            let mut open = OpenSession::new(site, session);
            let Some(session) = open.session.as_mut() else {
                return Vec::new();
            };

            let remaining = self.deadline.saturating_sub(started.elapsed());
            let outcome = tokio::time::timeout(remaining, scrape(session)).await;
            open.close().await;

            match outcome {
                Ok(Ok(products)) => {
                    tracing::info!(site, action, subject, count = products.len(), "scrape finished");
                    products
                }
                Ok(Err(e)) if e.is_timeout() => {
                    tracing::info!(site, action, subject, error = %e, "results marker did not render");
                    Vec::new()
                }
                Ok(Err(e)) => {
                    tracing::warn!(site, action, subject, error = %e, "scrape failed");
                    Vec::new()
                }
                Err(_) => {
                    tracing::warn!(site, action, subject, deadline_secs, "adapter deadline elapsed");
                    Vec::new()
                }
            }
        }
        .instrument(self.span.clone())
        .await
    }
}

/// An open page session that is closed even when the scrape holding it is
/// cancelled. The normal path closes inline via [`OpenSession::close`]; a
/// drop with the session still present hands the close to the runtime.
struct OpenSession {
    site: &'static str,
    session: Option<Box<dyn PageSession>>,
}

impl OpenSession {
    fn new(site: &'static str, session: Box<dyn PageSession>) -> Self {
        Self {
            site,
            session: Some(session),
        }
    }

    async fn close(&mut self) {
        if let Some(mut session) = self.session.take() {
            close_with_grace(self.site, session.as_mut()).await;
        }
    }
}

impl Drop for OpenSession {
    fn drop(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        let site = self.site;
        tracing::debug!(site, "scrape cancelled, closing page session");
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move { close_with_grace(site, session.as_mut()).await });
            }
            Err(_) => tracing::warn!(site, "no runtime to close cancelled page session"),
        }
    }
}

async fn close_with_grace(site: &'static str, session: &mut dyn PageSession) {
    match tokio::time::timeout(CLOSE_GRACE, session.close()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::warn!(site, error = %e, "page session did not close cleanly"),
        Err(_) => tracing::warn!(site, "page session close timed out"),
    }
}

/// `rows[1..len-2]`, empty when fewer than four rows exist.
pub(crate) fn inner_rows<T>(rows: &[T]) -> &[T] {
    rows.get(1..rows.len().saturating_sub(2)).unwrap_or(&[])
}
