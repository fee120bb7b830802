use thiserror::Error;

/// Failures raised by a page session or by DOM queries against its content.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("timed out after {waited_ms}ms waiting for \"{selector}\"")]
    Timeout { selector: String, waited_ms: u64 },

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("no element matches \"{selector}\"")]
    NoSuchElement { selector: String },

    #[error("invalid CSS selector \"{selector}\": {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("session backend does not support {operation}")]
    Unsupported { operation: &'static str },

    #[error("no page loaded; call navigate first")]
    NoPage,

    #[error("file error for {path}: {source}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl SessionError {
    /// `true` for the "results never rendered" outcome, which adapters report
    /// as an empty result rather than a failure.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, SessionError::Timeout { .. })
    }
}

/// A result card that cannot become a product record.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("card has no {field}")]
    MissingField { field: &'static str },
}
