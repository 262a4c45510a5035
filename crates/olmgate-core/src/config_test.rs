use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

/// Returns a map with all required env vars populated with valid defaults.
fn full_env<'a>() -> HashMap<&'a str, &'a str> {
    let mut m = HashMap::new();
    m.insert("OLMED_BASE_URL", "https://erp.olmed.example");
    m.insert("OLMED_USERNAME", "gateway");
    m.insert("OLMED_PASSWORD", "secret");
    m
}

#[test]
fn parse_environment_development() {
    assert_eq!(parse_environment("development"), Environment::Development);
}

#[test]
fn parse_environment_production() {
    assert_eq!(parse_environment("production"), Environment::Production);
}

#[test]
fn parse_environment_unknown_defaults_to_development() {
    assert_eq!(parse_environment("staging"), Environment::Development);
}

#[test]
fn build_app_config_fails_without_base_url() {
    let map: HashMap<&str, &str> = HashMap::new();
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "OLMED_BASE_URL"),
        "expected MissingEnvVar(OLMED_BASE_URL), got: {result:?}"
    );
}

#[test]
fn build_app_config_fails_without_credentials() {
    let mut map: HashMap<&str, &str> = HashMap::new();
    map.insert("OLMED_BASE_URL", "https://erp.olmed.example");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "OLMED_USERNAME"),
        "expected MissingEnvVar(OLMED_USERNAME), got: {result:?}"
    );
}

#[test]
fn build_app_config_fails_with_invalid_bind_addr() {
    let mut map = full_env();
    map.insert("OLMGATE_BIND_ADDR", "not-a-socket-addr");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "OLMGATE_BIND_ADDR"),
        "expected InvalidEnvVar(OLMGATE_BIND_ADDR), got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_zero_tick() {
    let mut map = full_env();
    map.insert("OLMGATE_SCHEDULER_TICK_SECS", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "OLMGATE_SCHEDULER_TICK_SECS"),
        "expected InvalidEnvVar(OLMGATE_SCHEDULER_TICK_SECS), got: {result:?}"
    );
}

#[test]
fn build_app_config_succeeds_with_all_required_vars() {
    let map = full_env();
    let result = build_app_config(lookup_from_map(&map));
    assert!(result.is_ok(), "expected Ok, got: {result:?}");
    let cfg = result.unwrap();
    assert_eq!(cfg.env, Environment::Development);
    assert_eq!(cfg.bind_addr.to_string(), "0.0.0.0:3000");
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.scheduler_tick_secs, 10);
    assert_eq!(cfg.http_timeout_secs, 30);
    assert_eq!(cfg.token_refresh_margin_secs, 300);
    assert_eq!(cfg.auth_max_retries, 3);
    assert_eq!(cfg.auth_retry_base_ms, 1000);
}

#[test]
fn build_app_config_tick_override() {
    let mut map = full_env();
    map.insert("OLMGATE_SCHEDULER_TICK_SECS", "5");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.scheduler_tick_secs, 5);
}

#[test]
fn build_app_config_refresh_margin_override() {
    let mut map = full_env();
    map.insert("OLMGATE_TOKEN_REFRESH_MARGIN_SECS", "60");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.token_refresh_margin_secs, 60);
}

#[test]
fn build_app_config_refresh_margin_invalid() {
    let mut map = full_env();
    map.insert("OLMGATE_TOKEN_REFRESH_MARGIN_SECS", "not-a-number");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "OLMGATE_TOKEN_REFRESH_MARGIN_SECS"),
        "expected InvalidEnvVar(OLMGATE_TOKEN_REFRESH_MARGIN_SECS), got: {result:?}"
    );
}

#[test]
fn build_app_config_redacts_password_in_debug() {
    let map = full_env();
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    let rendered = format!("{cfg:?}");
    assert!(!rendered.contains("secret"), "password leaked: {rendered}");
    assert!(rendered.contains("[redacted]"));
}
