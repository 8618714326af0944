use std::path::PathBuf;

use crate::app_config::AppConfig;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value cannot be parsed.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the
/// process, without touching `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value cannot be parsed.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can drive it with a plain
/// `HashMap` lookup instead of mutating process env vars.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default =
        |var: &str, default: &str| -> String { lookup(var).unwrap_or_else(|_| default.to_string()) };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let browser_api_url = or_default("TIXCRAWL_BROWSER_API_URL", "http://local.adspower.com:50325")
        .trim_end_matches('/')
        .to_string();
    let site_base_url = or_default("TIXCRAWL_SITE_BASE_URL", "https://www.stubhub.com")
        .trim_end_matches('/')
        .to_string();
    let log_level = or_default("TIXCRAWL_LOG_LEVEL", "info");
    let profiles_path = PathBuf::from(or_default(
        "TIXCRAWL_PROFILES_PATH",
        "./config/profiles.json",
    ));
    let output_dir = PathBuf::from(or_default("TIXCRAWL_OUTPUT_DIR", "."));

    let request_timeout_secs = parse_u64("TIXCRAWL_REQUEST_TIMEOUT_SECS", "30")?;
    let inter_request_delay_ms = parse_u64("TIXCRAWL_INTER_REQUEST_DELAY_MS", "0")?;

    let retry_attempts = or_default("TIXCRAWL_RETRY_ATTEMPTS", "3")
        .parse::<u32>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: "TIXCRAWL_RETRY_ATTEMPTS".to_string(),
            reason: e.to_string(),
        })?;
    if retry_attempts == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "TIXCRAWL_RETRY_ATTEMPTS".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    Ok(AppConfig {
        browser_api_url,
        site_base_url,
        log_level,
        profiles_path,
        output_dir,
        request_timeout_secs,
        retry_attempts,
        inter_request_delay_ms,
    })
}

#[cfg(test)]
mod tests {
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

    #[test]
    fn defaults_apply_with_empty_env() {
        let map: HashMap<&str, &str> = HashMap::new();
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.browser_api_url, "http://local.adspower.com:50325");
        assert_eq!(cfg.site_base_url, "https://www.stubhub.com");
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.profiles_path.to_str(), Some("./config/profiles.json"));
        assert_eq!(cfg.output_dir.to_str(), Some("."));
        assert_eq!(cfg.request_timeout_secs, 30);
        assert_eq!(cfg.retry_attempts, 3);
        assert_eq!(cfg.inter_request_delay_ms, 0);
    }

    #[test]
    fn overrides_are_honoured() {
        let mut map = HashMap::new();
        map.insert("TIXCRAWL_SITE_BASE_URL", "http://127.0.0.1:9000");
        map.insert("TIXCRAWL_RETRY_ATTEMPTS", "5");
        map.insert("TIXCRAWL_REQUEST_TIMEOUT_SECS", "10");
        map.insert("TIXCRAWL_INTER_REQUEST_DELAY_MS", "250");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.site_base_url, "http://127.0.0.1:9000");
        assert_eq!(cfg.retry_attempts, 5);
        assert_eq!(cfg.request_timeout_secs, 10);
        assert_eq!(cfg.inter_request_delay_ms, 250);
    }

    #[test]
    fn trailing_slashes_are_trimmed_from_base_urls() {
        let mut map = HashMap::new();
        map.insert("TIXCRAWL_SITE_BASE_URL", "https://example.com/");
        map.insert("TIXCRAWL_BROWSER_API_URL", "http://127.0.0.1:50325/");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.site_base_url, "https://example.com");
        assert_eq!(cfg.browser_api_url, "http://127.0.0.1:50325");
    }

    #[test]
    fn non_numeric_timeout_is_rejected() {
        let mut map = HashMap::new();
        map.insert("TIXCRAWL_REQUEST_TIMEOUT_SECS", "soon");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "TIXCRAWL_REQUEST_TIMEOUT_SECS"),
            "expected InvalidEnvVar, got: {result:?}"
        );
    }

    #[test]
    fn zero_retry_attempts_is_rejected() {
        let mut map = HashMap::new();
        map.insert("TIXCRAWL_RETRY_ATTEMPTS", "0");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "TIXCRAWL_RETRY_ATTEMPTS"),
            "expected InvalidEnvVar for zero attempts, got: {result:?}"
        );
    }
}
