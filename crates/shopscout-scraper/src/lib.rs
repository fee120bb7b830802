//! Storefront scraping for shopscout: page sessions, per-site adapters, the
//! adapter registry and the aggregator that fans a search out across sites.

pub mod adapters;
pub mod aggregator;
pub mod dom;
pub mod error;
pub mod normalize;
pub mod parse;
pub mod rate_limit;
pub mod registry;
pub mod session;

pub use adapters::{Adapter, AdapterEnv, ImageSearch, SiteAdapter};
pub use aggregator::Aggregator;
pub use dom::Element;
pub use error::{ExtractError, SessionError};
pub use rate_limit::PolitenessGate;
pub use registry::AdapterRegistry;
pub use session::{
    BrowserProfile, HttpSession, HttpSessionFactory, PageSession, ProxyConfig, SessionConfig,
    SessionFactory,
};
