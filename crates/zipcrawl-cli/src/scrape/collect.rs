//! Single consumer of the worker pool's result stream.

use tokio::sync::mpsc;
use zipcrawl_csv::{ResultSink, SinkError};
use zipcrawl_scraper::LocationResult;

/// Totals for one scrape batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BatchTotals {
    pub locations: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub records: usize,
    /// Requests across every location, failed ones included.
    pub request_count: u64,
}

/// Drains `rx` in completion order, appending each location's records to
/// `sink` as soon as it arrives.
///
/// A failed location is logged and skipped. A sink error aborts the batch;
/// dropping `rx` on return stops the workers at their next send.
pub(crate) async fn collect_results(
    mut rx: mpsc::Receiver<LocationResult>,
    sink: &ResultSink,
    total: usize,
) -> Result<BatchTotals, SinkError> {
    let mut totals = BatchTotals::default();

    while let Some(result) = rx.recv().await {
        totals.locations += 1;
        match result {
            Ok(outcome) => {
                totals.request_count += u64::from(outcome.request_count);
                let written = sink.append(&outcome.records)?;
                totals.records += written;
                totals.succeeded += 1;
                tracing::info!(
                    done = totals.locations,
                    total,
                    location = %outcome.location,
                    records = written,
                    requests = outcome.request_count,
                    pages = outcome.pages,
                    stop_reason = %outcome.stop_reason,
                    "location complete"
                );
            }
            Err(failure) => {
                totals.request_count += u64::from(failure.request_count);
                totals.failed += 1;
                tracing::warn!(
                    done = totals.locations,
                    total,
                    location = %failure.location,
                    page = failure.page,
                    requests = failure.request_count,
                    error = %failure.error,
                    "location failed; skipping"
                );
            }
        }
    }

    Ok(totals)
}

#[cfg(test)]
#[path = "collect_test.rs"]
mod tests;
