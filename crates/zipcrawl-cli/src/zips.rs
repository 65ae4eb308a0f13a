//! `zips` command: fetch the ZIP code list once.

use zipcrawl_scraper::{ClientConfig, HttpZipSource, RetryPolicy, ZipSource};

pub(crate) async fn run_zips(config: &zipcrawl_core::AppConfig) -> anyhow::Result<()> {
    tracing::info!("accessing ZIP codes");
    if config.zipcodes_path.exists() {
        tracing::info!(
            path = %config.zipcodes_path.display(),
            "ZIP code list already exists; delete it to regenerate"
        );
        return Ok(());
    }

    let url = config.require_zip_source_url()?;
    let retry = RetryPolicy {
        max_retries: config.scraper_max_retries,
        backoff_base_ms: config.scraper_retry_backoff_base_ms,
    };
    let source = HttpZipSource::new(&ClientConfig::from_app_config(config), url, retry)?;

    fetch_and_write(&source, &config.zipcodes_path).await
}

async fn fetch_and_write(source: &dyn ZipSource, path: &std::path::Path) -> anyhow::Result<()> {
    let records = source.fetch_zipcodes().await?;
    if zipcrawl_csv::write_zip_list(path, &records)? {
        tracing::info!(count = records.len(), "ZIP code list created");
    }
    Ok(())
}
