//! Shared domain types and configuration for shopscout.

pub mod app_config;
pub mod config;
pub mod products;
pub mod sites;

pub use app_config::{AppConfig, Environment};
pub use config::{build_app_config, load_app_config, load_app_config_from_env};
pub use products::{product_id, Availability, Product};
pub use sites::{Site, UnknownSite};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
