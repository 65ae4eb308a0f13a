use crate::app_config::AppConfig;
use crate::ConfigError;

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but cannot be parsed.
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
/// Returns `ConfigError` if a value is present but cannot be parsed.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can drive it with a
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let log_level = or_default("ZIPCRAWL_LOG_LEVEL", "info");
    let output_dir = PathBuf::from(or_default("ZIPCRAWL_OUTPUT_DIR", "./results"));
    let zipcodes_path = optional("ZIPCRAWL_ZIPCODES_PATH")
        .map_or_else(|| output_dir.join("zipcodes.csv"), PathBuf::from);
    let zip_source_url = optional("ZIPCRAWL_ZIP_SOURCE_URL");
    let location_column = parse_usize("ZIPCRAWL_LOCATION_COLUMN", "2")?;

    let scraper_request_timeout_secs = parse_u64("ZIPCRAWL_SCRAPER_REQUEST_TIMEOUT_SECS", "30")?;
    let scraper_connect_timeout_secs = parse_u64("ZIPCRAWL_SCRAPER_CONNECT_TIMEOUT_SECS", "10")?;
    let scraper_user_agent = or_default("ZIPCRAWL_SCRAPER_USER_AGENT", DEFAULT_USER_AGENT);
    let scraper_cookies = optional("ZIPCRAWL_SCRAPER_COOKIES");

    let scraper_workers = parse_usize("ZIPCRAWL_SCRAPER_WORKERS", "2")?;
    if scraper_workers == 0 {
        return Err(invalid(
            "ZIPCRAWL_SCRAPER_WORKERS",
            "must be at least 1".to_string(),
        ));
    }

    let scraper_max_pages = parse_u32("ZIPCRAWL_SCRAPER_MAX_PAGES", "69")?;
    if scraper_max_pages == 0 {
        return Err(invalid(
            "ZIPCRAWL_SCRAPER_MAX_PAGES",
            "must be at least 1".to_string(),
        ));
    }

    let scraper_mismatch_threshold = parse_usize("ZIPCRAWL_SCRAPER_MISMATCH_THRESHOLD", "5")?;
    if scraper_mismatch_threshold == 0 {
        return Err(invalid(
            "ZIPCRAWL_SCRAPER_MISMATCH_THRESHOLD",
            "must be at least 1".to_string(),
        ));
    }

    let scraper_max_retries = parse_u32("ZIPCRAWL_SCRAPER_MAX_RETRIES", "5")?;
    let scraper_retry_backoff_base_ms = parse_u64("ZIPCRAWL_SCRAPER_RETRY_BACKOFF_BASE_MS", "3000")?;
    let scraper_max_location_retries = optional("ZIPCRAWL_SCRAPER_MAX_LOCATION_RETRIES")
        .map(|raw| {
            raw.parse::<u32>()
                .map_err(|e| invalid("ZIPCRAWL_SCRAPER_MAX_LOCATION_RETRIES", e.to_string()))
        })
        .transpose()?;
    let scraper_inter_request_delay_ms = parse_u64("ZIPCRAWL_SCRAPER_INTER_REQUEST_DELAY_MS", "0")?;

    Ok(AppConfig {
        log_level,
        output_dir,
        zipcodes_path,
        zip_source_url,
        location_column,
        scraper_request_timeout_secs,
        scraper_connect_timeout_secs,
        scraper_user_agent,
        scraper_cookies,
        scraper_workers,
        scraper_max_pages,
        scraper_mismatch_threshold,
        scraper_max_retries,
        scraper_retry_backoff_base_ms,
        scraper_max_location_retries,
        scraper_inter_request_delay_ms,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
