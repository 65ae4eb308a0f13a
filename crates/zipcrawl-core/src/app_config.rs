use std::path::PathBuf;

use crate::ConfigError;

#[derive(Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub output_dir: PathBuf,
    pub zipcodes_path: PathBuf,
    pub zip_source_url: Option<String>,
    pub location_column: usize,
    pub scraper_request_timeout_secs: u64,
    pub scraper_connect_timeout_secs: u64,
    pub scraper_user_agent: String,
    pub scraper_cookies: Option<String>,
    pub scraper_workers: usize,
    pub scraper_max_pages: u32,
    pub scraper_mismatch_threshold: usize,
    pub scraper_max_retries: u32,
    pub scraper_retry_backoff_base_ms: u64,
    pub scraper_max_location_retries: Option<u32>,
    pub scraper_inter_request_delay_ms: u64,
}

impl AppConfig {
    /// Path of the result CSV for a locator site, e.g. `results/carecredit.csv`.
    #[must_use]
    pub fn result_path(&self, site: &str) -> PathBuf {
        self.output_dir.join(format!("{site}.csv"))
    }

    /// URL of the ZIP code provider, required only by the `zips` command.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] if `ZIPCRAWL_ZIP_SOURCE_URL` is unset.
    pub fn require_zip_source_url(&self) -> Result<&str, ConfigError> {
        self.zip_source_url
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvVar("ZIPCRAWL_ZIP_SOURCE_URL".to_string()))
    }

    /// Path of the log file for a command or site, e.g. `results/carecredit.log`.
    #[must_use]
    pub fn log_path(&self, name: &str) -> PathBuf {
        self.output_dir.join(format!("{name}.log"))
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("log_level", &self.log_level)
            .field("output_dir", &self.output_dir)
            .field("zipcodes_path", &self.zipcodes_path)
            .field("zip_source_url", &self.zip_source_url)
            .field("location_column", &self.location_column)
            .field(
                "scraper_request_timeout_secs",
                &self.scraper_request_timeout_secs,
            )
            .field(
                "scraper_connect_timeout_secs",
                &self.scraper_connect_timeout_secs,
            )
            .field("scraper_user_agent", &self.scraper_user_agent)
            .field(
                "scraper_cookies",
                &self.scraper_cookies.as_ref().map(|_| "[redacted]"),
            )
            .field("scraper_workers", &self.scraper_workers)
            .field("scraper_max_pages", &self.scraper_max_pages)
            .field(
                "scraper_mismatch_threshold",
                &self.scraper_mismatch_threshold,
            )
            .field("scraper_max_retries", &self.scraper_max_retries)
            .field(
                "scraper_retry_backoff_base_ms",
                &self.scraper_retry_backoff_base_ms,
            )
            .field(
                "scraper_max_location_retries",
                &self.scraper_max_location_retries,
            )
            .field(
                "scraper_inter_request_delay_ms",
                &self.scraper_inter_request_delay_ms,
            )
            .finish()
    }
}
