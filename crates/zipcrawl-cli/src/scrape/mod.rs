//! `scrape <site>` command: run the worker pool over every location and
//! append matches to the site's result file.

mod collect;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::ValueEnum;
use zipcrawl_core::{AppConfig, Location};
use zipcrawl_csv::ResultSink;
use zipcrawl_scraper::{
    spawn_pool, CareCreditSource, ClientConfig, LocatorSource, ScrapeSettings, WellsFargoSource,
};

use collect::{collect_results, BatchTotals};

/// Locator sites the CLI can scrape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum Site {
    #[value(name = "carecredit")]
    CareCredit,
    #[value(name = "wellsfargo")]
    WellsFargo,
}

impl Site {
    pub(crate) fn name(self) -> &'static str {
        match self {
            Site::CareCredit => "carecredit",
            Site::WellsFargo => "wellsfargo",
        }
    }

    fn source(self) -> Arc<dyn LocatorSource> {
        match self {
            Site::CareCredit => Arc::new(CareCreditSource::new()),
            Site::WellsFargo => Arc::new(WellsFargoSource::new()),
        }
    }
}

pub(crate) async fn run_scrape(
    config: &AppConfig,
    site: Site,
    limit: Option<usize>,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let mut locations = zipcrawl_csv::load_locations(&config.zipcodes_path, config.location_column)
        .with_context(|| {
            format!(
                "reading locations from {} (run `zipcrawl-cli zips` first)",
                config.zipcodes_path.display()
            )
        })?;
    if let Some(limit) = limit {
        locations.truncate(limit);
    }

    let sink_path = output.unwrap_or_else(|| config.result_path(site.name()));
    let sink = ResultSink::open(&sink_path)?;

    let totals = scrape_batch(
        site.source(),
        &ClientConfig::from_app_config(config),
        ScrapeSettings::from_app_config(config),
        locations,
        config.scraper_workers,
        &sink,
    )
    .await?;

    if totals.failed > 0 {
        tracing::warn!(
            failed = totals.failed,
            "some locations failed and were skipped; see warnings above"
        );
    }
    Ok(())
}

/// Scrapes `locations` with a pool of `workers` and drains the results into
/// `sink`.
pub(crate) async fn scrape_batch(
    source: Arc<dyn LocatorSource>,
    client_config: &ClientConfig,
    settings: ScrapeSettings,
    locations: Vec<Location>,
    workers: usize,
    sink: &ResultSink,
) -> anyhow::Result<BatchTotals> {
    let total = locations.len();
    let site = source.name();
    tracing::info!(site, total, workers, output = %sink.path().display(), "starting scrape");

    let rx = spawn_pool(source, client_config, settings, locations, workers)?;
    let totals = collect_results(rx, sink, total).await?;

    tracing::info!(
        site,
        locations = totals.locations,
        succeeded = totals.succeeded,
        failed = totals.failed,
        records = totals.records,
        total_requests = totals.request_count,
        "Total requests: {}",
        totals.request_count
    );
    Ok(totals)
}

#[cfg(test)]
#[path = "scrape_test.rs"]
mod tests;
