use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can drive it with a `HashMap`.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let env = parse_environment(&or_default("SHOPSCOUT_ENV", "development"))?;
    let bind_addr: SocketAddr = parse_as(
        "SHOPSCOUT_BIND_ADDR",
        &or_default("SHOPSCOUT_BIND_ADDR", "0.0.0.0:8000"),
    )?;
    let log_level = or_default("SHOPSCOUT_LOG_LEVEL", "info");
    let scraperapi_key = optional("SCRAPERAPI_KEY");
    let proxy_host = or_default("SHOPSCOUT_PROXY_HOST", "proxy-server.scraperapi.com");
    let proxy_port: u16 = parse_as(
        "SHOPSCOUT_PROXY_PORT",
        &or_default("SHOPSCOUT_PROXY_PORT", "8001"),
    )?;
    let session_timeout_secs: u64 = parse_as(
        "SHOPSCOUT_SESSION_TIMEOUT_SECS",
        &or_default("SHOPSCOUT_SESSION_TIMEOUT_SECS", "60"),
    )?;
    let adapter_deadline_secs: u64 = parse_as(
        "SHOPSCOUT_ADAPTER_DEADLINE_SECS",
        &or_default("SHOPSCOUT_ADAPTER_DEADLINE_SECS", "60"),
    )?;
    let jiomart_pincode = or_default("SHOPSCOUT_JIOMART_PINCODE", "400020");
    let croma_politeness_ms: u64 = parse_as(
        "SHOPSCOUT_CROMA_POLITENESS_MS",
        &or_default("SHOPSCOUT_CROMA_POLITENESS_MS", "10000"),
    )?;
    let max_upload_bytes: usize = parse_as(
        "SHOPSCOUT_MAX_UPLOAD_BYTES",
        &or_default("SHOPSCOUT_MAX_UPLOAD_BYTES", "10485760"),
    )?;

    if adapter_deadline_secs == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "SHOPSCOUT_ADAPTER_DEADLINE_SECS".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }

    if jiomart_pincode.len() != 6 || !jiomart_pincode.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ConfigError::InvalidEnvVar {
            var: "SHOPSCOUT_JIOMART_PINCODE".to_string(),
            reason: format!("expected a 6-digit pincode, got \"{jiomart_pincode}\""),
        });
    }

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        scraperapi_key,
        proxy_host,
        proxy_port,
        session_timeout_secs,
        adapter_deadline_secs,
        jiomart_pincode,
        croma_politeness_ms,
        max_upload_bytes,
    })
}

fn parse_as<T>(var: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for anything other than
/// `development`, `test`, or `production`.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "SHOPSCOUT_ENV".to_string(),
            reason: format!("unknown environment \"{other}\""),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
