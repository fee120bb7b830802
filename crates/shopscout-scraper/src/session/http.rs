//! Plain-HTTP session backend.
//!
//! Each navigation is a single GET; the response body becomes a static DOM
//! snapshot. Nothing executes scripts, so a selector absent from the served
//! HTML will never appear and `wait_for_selector` reports the timeout
//! immediately. Interactive steps (`click`, `upload_file`) are unsupported.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, COOKIE};
use reqwest::{Client, Proxy};

use super::{PageSession, SessionConfig, SessionFactory};
use crate::dom::Element;
use crate::error::SessionError;

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Opens an [`HttpSession`] per call, honoring the config's proxy and profile.
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpSessionFactory;

#[async_trait]
impl SessionFactory for HttpSessionFactory {
    async fn open(&self, config: &SessionConfig) -> Result<Box<dyn PageSession>, SessionError> {
        Ok(Box::new(HttpSession::new(config)?))
    }
}

pub struct HttpSession {
    client: Client,
    accept_language: String,
    cookies: Vec<(String, String)>,
    html: Option<String>,
}

impl HttpSession {
    /// Builds the underlying `reqwest::Client` for `config`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Http`] if the proxy URL is invalid or the
    /// client cannot be constructed.
    pub fn new(config: &SessionConfig) -> Result<Self, SessionError> {
        let mut builder = Client::builder()
            .timeout(config.page_load_timeout)
            .user_agent(config.profile.user_agent.as_str());

        if let Some(proxy) = &config.proxy {
            let proxy = Proxy::all(proxy.url())?.basic_auth(&proxy.username, proxy.password());
            // The proxy terminates TLS and re-signs with its own certificate.
            builder = builder.proxy(proxy).danger_accept_invalid_certs(true);
        }

        Ok(Self {
            client: builder.build()?,
            accept_language: config.profile.accept_language.clone(),
            cookies: Vec::new(),
            html: None,
        })
    }

    fn document(&self) -> Result<Element, SessionError> {
        self.html
            .as_deref()
            .map(Element::from_document)
            .ok_or(SessionError::NoPage)
    }

    fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        Some(
            self.cookies
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

#[async_trait]
impl PageSession for HttpSession {
    async fn navigate(&mut self, url: &str) -> Result<(), SessionError> {
        self.html = None;

        let mut request = self
            .client
            .get(url)
            .header(ACCEPT, ACCEPT_HTML)
            .header(ACCEPT_LANGUAGE, self.accept_language.as_str());
        if let Some(cookie) = self.cookie_header() {
            request = request.header(COOKIE, cookie);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SessionError::Navigation {
                url: url.to_string(),
                reason: format!("HTTP {status}"),
            });
        }

        let html = response.text().await?;
        tracing::debug!(url, status = status.as_u16(), bytes = html.len(), "page loaded");
        self.html = Some(html);
        Ok(())
    }

    async fn set_cookie(&mut self, name: &str, value: &str) -> Result<(), SessionError> {
        self.cookies.retain(|(existing, _)| existing != name);
        self.cookies.push((name.to_string(), value.to_string()));
        Ok(())
    }

    async fn wait_for_selector(
        &mut self,
        css: &str,
        timeout: Duration,
    ) -> Result<Element, SessionError> {
        self.document()?
            .find(css)?
            .ok_or_else(|| SessionError::Timeout {
                selector: css.to_string(),
                waited_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            })
    }

    async fn find_all(&mut self, css: &str) -> Result<Vec<Element>, SessionError> {
        self.document()?.find_all(css)
    }

    async fn click(&mut self, _css: &str, _timeout: Duration) -> Result<(), SessionError> {
        Err(SessionError::Unsupported { operation: "click" })
    }

    async fn upload_file(&mut self, _css: &str, _path: &Path) -> Result<(), SessionError> {
        Err(SessionError::Unsupported {
            operation: "upload_file",
        })
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        self.html = None;
        self.cookies.clear();
        Ok(())
    }
}
