use crate::app_config::{
    AppConfig, RouteConfig, Timings, DEFAULT_CONTROL_MARKER, DEFAULT_DETAIL_PATH,
    DEFAULT_DISABLE_PARAM, DEFAULT_EDIT_PARAM, DEFAULT_EDIT_PATH, DEFAULT_NAMESPACE,
    DEFAULT_ORDER_PARAM, DEFAULT_STORE_PATH, DEFAULT_VALUE_PREFIX,
};
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

/// Build configuration using the provided env-var lookup function.
///
/// Every variable has a default, so an empty environment yields
/// [`AppConfig::default`].
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;
    use std::time::Duration;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_ms = |var: &str, default: u64| -> Result<Duration, ConfigError> {
        match lookup(var) {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|e| ConfigError::InvalidEnvVar {
                    var: var.to_string(),
                    reason: e.to_string(),
                }),
            Err(_) => Ok(Duration::from_millis(default)),
        }
    };

    let defaults = Timings::default();

    let namespace = or_default("ADDRFIX_NAMESPACE", DEFAULT_NAMESPACE);
    validate_namespace(&namespace)?;

    let store_path = PathBuf::from(or_default("ADDRFIX_STORE_PATH", DEFAULT_STORE_PATH));
    let log_level = or_default("ADDRFIX_LOG_LEVEL", "info");

    let routes = RouteConfig {
        detail_path: or_default("ADDRFIX_DETAIL_PATH", DEFAULT_DETAIL_PATH),
        edit_path: or_default("ADDRFIX_EDIT_PATH", DEFAULT_EDIT_PATH),
        order_param: or_default("ADDRFIX_ORDER_PARAM", DEFAULT_ORDER_PARAM),
        edit_param: or_default("ADDRFIX_EDIT_PARAM", DEFAULT_EDIT_PARAM),
        disable_param: or_default("ADDRFIX_DISABLE_PARAM", DEFAULT_DISABLE_PARAM),
    };

    let control_marker = or_default("ADDRFIX_CONTROL_MARKER", DEFAULT_CONTROL_MARKER);
    let value_prefix = or_default("ADDRFIX_VALUE_PREFIX", DEFAULT_VALUE_PREFIX);

    let discovery_offsets = match lookup("ADDRFIX_DISCOVERY_OFFSETS_MS") {
        Ok(raw) => parse_discovery_offsets(&raw)?,
        Err(_) => defaults.discovery_offsets,
    };

    let max_attempts = match lookup("ADDRFIX_MAX_ATTEMPTS") {
        Ok(raw) => parse_max_attempts(&raw)?,
        Err(_) => defaults.max_attempts,
    };

    let timings = Timings {
        capture_delay: parse_ms("ADDRFIX_CAPTURE_DELAY_MS", 1_000)?,
        discovery_offsets,
        retry_interval: parse_ms("ADDRFIX_RETRY_INTERVAL_MS", 250)?,
        max_attempts,
        debounce: parse_ms("ADDRFIX_DEBOUNCE_MS", 100)?,
        observe_timeout: parse_ms("ADDRFIX_OBSERVE_TIMEOUT_MS", 5_000)?,
        navigation_delay: parse_ms("ADDRFIX_NAVIGATION_DELAY_MS", 500)?,
    };

    Ok(AppConfig {
        namespace,
        store_path,
        log_level,
        routes,
        control_marker,
        value_prefix,
        timings,
    })
}

/// The namespace is the first segment of every storage key, so it must be
/// non-empty and free of the `:` separator.
fn validate_namespace(namespace: &str) -> Result<(), ConfigError> {
    if namespace.is_empty() || namespace.contains(':') {
        return Err(ConfigError::InvalidEnvVar {
            var: "ADDRFIX_NAMESPACE".to_string(),
            reason: format!("namespace must be non-empty and contain no ':' (got \"{namespace}\")"),
        });
    }
    Ok(())
}

/// Parses `"300,1200"` into exactly two ascending offsets.
fn parse_discovery_offsets(raw: &str) -> Result<[std::time::Duration; 2], ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidEnvVar {
        var: "ADDRFIX_DISCOVERY_OFFSETS_MS".to_string(),
        reason,
    };

    let values = raw
        .split(',')
        .map(|part| part.trim().parse::<u64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| invalid(e.to_string()))?;

    match values.as_slice() {
        [first, second] if first <= second => Ok([
            std::time::Duration::from_millis(*first),
            std::time::Duration::from_millis(*second),
        ]),
        [_, _] => Err(invalid("offsets must be ascending".to_string())),
        other => Err(invalid(format!(
            "expected exactly two offsets, got {}",
            other.len()
        ))),
    }
}

fn parse_max_attempts(raw: &str) -> Result<u32, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidEnvVar {
        var: "ADDRFIX_MAX_ATTEMPTS".to_string(),
        reason,
    };
    let attempts = raw.trim().parse::<u32>().map_err(|e| invalid(e.to_string()))?;
    if attempts == 0 {
        return Err(invalid("at least one attempt is required".to_string()));
    }
    Ok(attempts)
}
