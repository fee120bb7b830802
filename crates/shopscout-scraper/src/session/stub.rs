//! Scripted in-memory sessions for adapter tests.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::{PageSession, SessionConfig, SessionFactory};
use crate::dom::Element;
use crate::error::SessionError;

const BLANK_PAGE: &str = "<html><body></body></html>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    Open,
    Navigate,
    SetCookie,
    Wait,
    FindAll,
    Click,
    Upload,
    Close,
}

impl Step {
    pub(crate) const ALL: [Step; 8] = [
        Step::Open,
        Step::Navigate,
        Step::SetCookie,
        Step::Wait,
        Step::FindAll,
        Step::Click,
        Step::Upload,
        Step::Close,
    ];
}

/// Shared record of what the sessions opened by one factory did.
#[derive(Debug, Default)]
pub(crate) struct StubLog {
    calls: Mutex<Vec<String>>,
    opened: AtomicUsize,
    closed: AtomicUsize,
    configs: Mutex<Vec<SessionConfig>>,
}

impl StubLog {
    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub(crate) fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    pub(crate) fn configs(&self) -> Vec<SessionConfig> {
        self.configs.lock().unwrap().clone()
    }
}

/// Serves canned HTML by URL prefix. A step can be made to fail or to hang
/// forever.
#[derive(Debug, Clone, Default)]
pub(crate) struct StubSessionFactory {
    routes: Vec<(String, String)>,
    after_upload: Option<String>,
    fail_at: Option<Step>,
    hang_at: Option<Step>,
    log: Arc<StubLog>,
}

impl StubSessionFactory {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn route(mut self, url_prefix: &str, html: impl Into<String>) -> Self {
        self.routes.push((url_prefix.to_string(), html.into()));
        self
    }

    /// Page shown after a successful `upload_file`.
    pub(crate) fn after_upload(mut self, html: impl Into<String>) -> Self {
        self.after_upload = Some(html.into());
        self
    }

    pub(crate) fn fail_at(mut self, step: Step) -> Self {
        self.fail_at = Some(step);
        self
    }

    pub(crate) fn hang_at(mut self, step: Step) -> Self {
        self.hang_at = Some(step);
        self
    }

    pub(crate) fn log(&self) -> Arc<StubLog> {
        Arc::clone(&self.log)
    }
}

#[async_trait]
impl SessionFactory for StubSessionFactory {
    async fn open(&self, config: &SessionConfig) -> Result<Box<dyn PageSession>, SessionError> {
        self.log.record("open".to_string());
        self.log.configs.lock().unwrap().push(config.clone());
        gate(self.fail_at, self.hang_at, Step::Open).await?;
        self.log.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(StubSession {
            factory: self.clone(),
            html: None,
        }))
    }
}

struct StubSession {
    factory: StubSessionFactory,
    html: Option<String>,
}

impl StubSession {
    async fn step(&self, step: Step, call: String) -> Result<(), SessionError> {
        self.factory.log.record(call);
        gate(self.factory.fail_at, self.factory.hang_at, step).await
    }

    fn document(&self) -> Result<Element, SessionError> {
        self.html
            .as_deref()
            .map(Element::from_document)
            .ok_or(SessionError::NoPage)
    }
}

async fn gate(fail_at: Option<Step>, hang_at: Option<Step>, step: Step) -> Result<(), SessionError> {
    if hang_at == Some(step) {
        std::future::pending::<()>().await;
    }
    if fail_at == Some(step) {
        return Err(SessionError::Navigation {
            url: "stub://".to_string(),
            reason: format!("injected failure at {step:?}"),
        });
    }
    Ok(())
}

fn timeout_error(css: &str, timeout: Duration) -> SessionError {
    SessionError::Timeout {
        selector: css.to_string(),
        waited_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
    }
}

#[async_trait]
impl PageSession for StubSession {
    async fn navigate(&mut self, url: &str) -> Result<(), SessionError> {
        self.step(Step::Navigate, format!("navigate {url}")).await?;
        let html = self
            .factory
            .routes
            .iter()
            .find(|(prefix, _)| url.starts_with(prefix.as_str()))
            .map_or(BLANK_PAGE, |(_, html)| html.as_str());
        self.html = Some(html.to_string());
        Ok(())
    }

    async fn set_cookie(&mut self, name: &str, value: &str) -> Result<(), SessionError> {
        self.step(Step::SetCookie, format!("set_cookie {name}={value}"))
            .await
    }

    async fn wait_for_selector(
        &mut self,
        css: &str,
        timeout: Duration,
    ) -> Result<Element, SessionError> {
        self.step(Step::Wait, format!("wait {css}")).await?;
        self.document()?
            .find(css)?
            .ok_or_else(|| timeout_error(css, timeout))
    }

    async fn find_all(&mut self, css: &str) -> Result<Vec<Element>, SessionError> {
        self.step(Step::FindAll, format!("find_all {css}")).await?;
        self.document()?.find_all(css)
    }

    async fn click(&mut self, css: &str, timeout: Duration) -> Result<(), SessionError> {
        self.step(Step::Click, format!("click {css}")).await?;
        match self.document()?.find(css)? {
            Some(_) => Ok(()),
            None => Err(timeout_error(css, timeout)),
        }
    }

    async fn upload_file(&mut self, css: &str, path: &Path) -> Result<(), SessionError> {
        self.step(Step::Upload, format!("upload {css} {}", path.display()))
            .await?;
        if self.document()?.find(css)?.is_none() {
            return Err(SessionError::NoSuchElement {
                selector: css.to_string(),
            });
        }
        if let Some(html) = &self.factory.after_upload {
            self.html = Some(html.clone());
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        self.factory.log.record("close".to_string());
        self.factory.log.closed.fetch_add(1, Ordering::SeqCst);
        self.html = None;
        gate(self.factory.fail_at, None, Step::Close).await
    }
}
