use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files, which is useful for testing
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual environment
/// so it can be tested with a pure `HashMap` lookup, no `set_var`/`remove_var` needed.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let olmed_base_url = require("OLMED_BASE_URL")?;
    let olmed_username = require("OLMED_USERNAME")?;
    let olmed_password = require("OLMED_PASSWORD")?;

    let env = parse_environment(&or_default("OLMGATE_ENV", "development"));

    let bind_addr = parse_addr("OLMGATE_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("OLMGATE_LOG_LEVEL", "info");

    let scheduler_tick_secs = parse_u64("OLMGATE_SCHEDULER_TICK_SECS", "10")?;
    if scheduler_tick_secs == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "OLMGATE_SCHEDULER_TICK_SECS".to_string(),
            reason: "tick period must be greater than zero".to_string(),
        });
    }

    let http_timeout_secs = parse_u64("OLMGATE_HTTP_TIMEOUT_SECS", "30")?;
    let token_refresh_margin_secs = parse_u64("OLMGATE_TOKEN_REFRESH_MARGIN_SECS", "300")?;
    let auth_max_retries = parse_u32("OLMGATE_AUTH_MAX_RETRIES", "3")?;
    let auth_retry_base_ms = parse_u64("OLMGATE_AUTH_RETRY_BASE_MS", "1000")?;

    let product_sync_path = PathBuf::from(or_default(
        "OLMGATE_PRODUCT_SYNC_PATH",
        "./config/product_sync.json",
    ));
    let order_sync_path = PathBuf::from(or_default(
        "OLMGATE_ORDER_SYNC_PATH",
        "./config/order_sync.json",
    ));

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        olmed_base_url,
        olmed_username,
        olmed_password,
        scheduler_tick_secs,
        http_timeout_secs,
        token_refresh_margin_secs,
        auth_max_retries,
        auth_retry_base_ms,
        product_sync_path,
        order_sync_path,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
