//! Per-location pagination loop over a pluggable locator source.
//!
//! A [`LocatorSource`] knows how to fetch and parse one page of a single
//! site. [`scrape_location`] drives it page by page, keeps entries whose
//! postal code equals the location, and decides when to stop.

mod formats;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use zipcrawl_core::{Location, ResultRecord};

use crate::client::{LocatorClient, RawPage};
use crate::error::ScraperError;
use crate::retry::{retry_with_backoff, RetryBudget, RetryPolicy};

pub use formats::{CareCreditSource, WellsFargoSource};
pub use types::{LocationFailure, PageEntry, ParsedPage, ScrapeOutcome, StopReason};

/// One external locator site.
///
/// Site-specific request shapes, sentinels, and selectors stay behind this
/// trait; the scrape loop only sees [`RawPage`]s and [`ParsedPage`]s.
#[async_trait]
pub trait LocatorSource: Send + Sync {
    /// Short site name used for logs and output file names.
    fn name(&self) -> &'static str;

    /// Scheme and host the worker's cookies are scoped to.
    fn origin(&self) -> &str;

    /// Headers every request to this site carries unless configured otherwise.
    fn default_headers(&self) -> &'static [(&'static str, &'static str)] {
        &[]
    }

    /// Entries on a full page, or `None` when the site has no fixed page size.
    fn full_page_size(&self) -> Option<usize>;

    /// Fetches page `page` (1-based) of results for `location`.
    async fn fetch_page(
        &self,
        client: &LocatorClient,
        location: &Location,
        page: u32,
    ) -> Result<RawPage, ScraperError>;

    /// Parses a fetched page into entries or a no-results sentinel.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::ParseAnomaly`] when the body is neither.
    fn parse_page(&self, location: &Location, page: &RawPage) -> Result<ParsedPage, ScraperError>;
}

/// Knobs for the pagination loop.
#[derive(Debug, Clone)]
pub struct ScrapeSettings {
    /// Hard page cap per location.
    pub max_pages: u32,
    /// Consecutive non-matching entries that abort pagination.
    pub mismatch_threshold: usize,
    pub retry: RetryPolicy,
    /// Total retries one location may spend across all pages.
    pub max_location_retries: Option<u32>,
    /// Pause between consecutive page requests of one location.
    pub inter_request_delay_ms: u64,
}

impl Default for ScrapeSettings {
    fn default() -> Self {
        Self {
            max_pages: 69,
            mismatch_threshold: 5,
            retry: RetryPolicy::default(),
            max_location_retries: None,
            inter_request_delay_ms: 0,
        }
    }
}

impl ScrapeSettings {
    #[must_use]
    pub fn from_app_config(config: &zipcrawl_core::AppConfig) -> Self {
        Self {
            max_pages: config.scraper_max_pages,
            mismatch_threshold: config.scraper_mismatch_threshold.max(1),
            retry: RetryPolicy {
                max_retries: config.scraper_max_retries,
                backoff_base_ms: config.scraper_retry_backoff_base_ms,
            },
            max_location_retries: config.scraper_max_location_retries,
            inter_request_delay_ms: config.scraper_inter_request_delay_ms,
        }
    }
}

/// Scrape every page of `location` from `source`.
///
/// Request counting: every attempt that received an HTTP response is
/// counted, including non-2xx and rejected-session responses. Transport
/// failures that never produced a response are not.
///
/// # Errors
///
/// Returns a [`LocationFailure`] when a page cannot be fetched within the
/// retry policy or its body is a parse anomaly. Records gathered on earlier
/// pages are dropped; the request count is kept.
pub async fn scrape_location(
    source: &dyn LocatorSource,
    client: &LocatorClient,
    location: &Location,
    settings: &ScrapeSettings,
) -> Result<ScrapeOutcome, LocationFailure> {
    let mut records: Vec<ResultRecord> = Vec::new();
    let mut request_count = 0u32;
    let mut mismatches = 0usize;
    let mut budget = RetryBudget::new(settings.max_location_retries);
    let threshold = settings.mismatch_threshold.max(1);

    let fail = |page: u32, request_count: u32, error: ScraperError| LocationFailure {
        location: location.clone(),
        page,
        request_count,
        error,
    };

    let mut page = 0u32;
    let mut stop_reason = StopReason::PageCap;
    while page < settings.max_pages {
        page += 1;
        if page > 1 && settings.inter_request_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(settings.inter_request_delay_ms)).await;
        }

        let attempted = retry_with_backoff(&settings.retry, &mut budget, move || {
            source.fetch_page(client, location, page)
        })
        .await;
        request_count = request_count.saturating_add(attempted.responded);
        let raw = attempted
            .result
            .map_err(|e| fail(page, request_count, e))?;

        let entries = match source
            .parse_page(location, &raw)
            .map_err(|e| fail(page, request_count, e))?
        {
            ParsedPage::Entries(entries) => entries,
            ParsedPage::NoResults => {
                stop_reason = StopReason::NoResults;
                break;
            }
        };

        let entry_count = entries.len();
        let aborted = scan_entries(location, entries, &mut mismatches, threshold, &mut records);
        tracing::debug!(
            source = source.name(),
            location = %location,
            page,
            entry_count,
            matched = records.len(),
            mismatches,
            "scanned locator page"
        );

        if let Some(reason) = stop_after_page(aborted, entry_count, source.full_page_size()) {
            stop_reason = reason;
            break;
        }
    }

    Ok(ScrapeOutcome {
        location: location.clone(),
        records,
        request_count,
        pages: page,
        stop_reason,
    })
}

/// Appends matching entries to `records` in page order.
///
/// A match resets `mismatches`; a non-match increments it, and reaching
/// `threshold` stops the scan of the remaining entries. Returns `true` when
/// the scan was cut short.
fn scan_entries(
    location: &Location,
    entries: Vec<PageEntry>,
    mismatches: &mut usize,
    threshold: usize,
    records: &mut Vec<ResultRecord>,
) -> bool {
    for entry in entries {
        if location.matches(&entry.zipcode) {
            records.push(entry.into_record(location));
            *mismatches = 0;
        } else {
            *mismatches += 1;
            if *mismatches >= threshold {
                return true;
            }
        }
    }
    false
}

/// Stop conditions, checked in order: mismatch abort, short page, empty page.
fn stop_after_page(
    aborted: bool,
    entry_count: usize,
    full_page_size: Option<usize>,
) -> Option<StopReason> {
    if aborted {
        return Some(StopReason::MismatchThreshold);
    }
    if full_page_size.is_some_and(|full| entry_count < full) {
        return Some(StopReason::PartialPage);
    }
    if entry_count == 0 {
        return Some(StopReason::EmptyPage);
    }
    None
}

#[cfg(test)]
#[path = "scrape_test.rs"]
mod tests;
