use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// Proxy credential. Adapters that route through the proxy refuse to
    /// build without it; the others ignore it.
    pub scraperapi_key: Option<String>,
    pub proxy_host: String,
    pub proxy_port: u16,
    /// Upper bound on a single page load.
    pub session_timeout_secs: u64,
    /// Upper bound on one adapter invocation, session setup to close.
    pub adapter_deadline_secs: u64,
    /// Delivery pincode sent to JioMart so listings are localized.
    pub jiomart_pincode: String,
    /// Minimum gap between consecutive Croma searches.
    pub croma_politeness_ms: u64,
    pub max_upload_bytes: usize,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field(
                "scraperapi_key",
                &self.scraperapi_key.as_ref().map(|_| "[redacted]"),
            )
            .field("proxy_host", &self.proxy_host)
            .field("proxy_port", &self.proxy_port)
            .field("session_timeout_secs", &self.session_timeout_secs)
            .field("adapter_deadline_secs", &self.adapter_deadline_secs)
            .field("jiomart_pincode", &self.jiomart_pincode)
            .field("croma_politeness_ms", &self.croma_politeness_ms)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .finish()
    }
}
