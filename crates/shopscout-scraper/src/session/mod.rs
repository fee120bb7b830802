//! The page-session capability adapters drive.
//!
//! A [`PageSession`] is a single browsing context: navigate, wait for
//! elements, query them, and (where the backend can) interact with the page.
//! Sessions are opened per adapter invocation from a [`SessionFactory`] and
//! owned exclusively by that invocation until `close`.

pub mod http;
#[cfg(test)]
pub(crate) mod stub;

use std::fmt;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use crate::dom::Element;
use crate::error::SessionError;

pub use http::{HttpSession, HttpSessionFactory};

/// Authenticated forward proxy that sessions route traffic through.
#[derive(Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    password: String,
}

impl ProxyConfig {
    #[must_use]
    pub fn new(
        host: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            username: username.into(),
            password: password.into(),
        }
    }

    /// Proxy URL without credentials, e.g. `http://proxy-server.scraperapi.com:8001`.
    #[must_use]
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    pub(crate) fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for ProxyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"[redacted]")
            .finish()
    }
}

/// Client identity presented to the storefront.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserProfile {
    pub user_agent: String,
    pub accept_language: String,
}

impl BrowserProfile {
    #[must_use]
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
            accept_language: "en-IN,en;q=0.9".to_string(),
        }
    }
}

/// Immutable settings for opening a session. Adapters build one at
/// construction and pass it by reference to every acquisition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub proxy: Option<ProxyConfig>,
    pub profile: BrowserProfile,
    /// Upper bound for a single page load.
    pub page_load_timeout: Duration,
}

#[async_trait]
pub trait PageSession: Send {
    /// Loads `url` as the current page.
    async fn navigate(&mut self, url: &str) -> Result<(), SessionError>;

    /// Sets a cookie sent with subsequent navigations.
    async fn set_cookie(&mut self, name: &str, value: &str) -> Result<(), SessionError>;

    /// Waits up to `timeout` for the first element matching `css`.
    ///
    /// Returns [`SessionError::Timeout`] when nothing matches in time.
    async fn wait_for_selector(
        &mut self,
        css: &str,
        timeout: Duration,
    ) -> Result<Element, SessionError>;

    /// All elements on the current page matching `css`, in document order.
    async fn find_all(&mut self, css: &str) -> Result<Vec<Element>, SessionError>;

    /// Waits up to `timeout` for `css` to become clickable, then clicks it.
    async fn click(&mut self, css: &str, timeout: Duration) -> Result<(), SessionError>;

    /// Feeds a local file to the file input matching `css`.
    async fn upload_file(&mut self, css: &str, path: &Path) -> Result<(), SessionError>;

    /// Releases the session. Called exactly once per opened session.
    async fn close(&mut self) -> Result<(), SessionError>;
}

#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self, config: &SessionConfig) -> Result<Box<dyn PageSession>, SessionError>;
}
