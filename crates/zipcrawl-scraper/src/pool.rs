//! Fixed-size worker pool that scrapes locations concurrently.
//!
//! Each worker owns a [`LocatorClient`] (and therefore its own cookie jar)
//! and pulls the next location off a shared queue. Results are sent on a
//! bounded channel in completion order, so the consumer never waits on a
//! slow location to emit faster ones.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use zipcrawl_core::Location;

use crate::client::{ClientConfig, LocatorClient};
use crate::error::ScraperError;
use crate::locator::{scrape_location, LocationFailure, LocatorSource, ScrapeOutcome, ScrapeSettings};

/// What a worker reports for one location.
pub type LocationResult = Result<ScrapeOutcome, LocationFailure>;

type Queue = Arc<Mutex<VecDeque<(usize, Location)>>>;

/// Starts `workers` workers over `locations` and returns the result stream.
///
/// The channel closes once every location has been reported. A location
/// whose task panics is reported as a [`LocationFailure`] carrying
/// [`ScraperError::TaskFailed`]; the rest of the batch keeps going.
///
/// Must be called from within a Tokio runtime.
///
/// # Errors
///
/// Returns a [`ScraperError`] if a worker's HTTP client cannot be built.
pub fn spawn_pool(
    source: Arc<dyn LocatorSource>,
    client_config: &ClientConfig,
    settings: ScrapeSettings,
    locations: Vec<Location>,
    workers: usize,
) -> Result<mpsc::Receiver<LocationResult>, ScraperError> {
    let total = locations.len();
    let workers = workers.clamp(1, total.max(1));

    let clients = (0..workers)
        .map(|_| LocatorClient::for_source(client_config, source.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;

    let queue: Queue = Arc::new(Mutex::new(locations.into_iter().enumerate().collect()));
    let settings = Arc::new(settings);
    let (tx, rx) = mpsc::channel(workers * 2);

    tracing::info!(
        source = source.name(),
        workers,
        total,
        "starting locator worker pool"
    );

    for (worker, client) in clients.into_iter().enumerate() {
        tokio::spawn(run_worker(
            worker,
            total,
            Arc::clone(&source),
            client,
            Arc::clone(&settings),
            Arc::clone(&queue),
            tx.clone(),
        ));
    }

    Ok(rx)
}

async fn run_worker(
    worker: usize,
    total: usize,
    source: Arc<dyn LocatorSource>,
    client: LocatorClient,
    settings: Arc<ScrapeSettings>,
    queue: Queue,
    tx: mpsc::Sender<LocationResult>,
) {
    loop {
        let Some((index, location)) = queue.lock().await.pop_front() else {
            break;
        };
        tracing::info!(
            source = source.name(),
            worker,
            index = index + 1,
            total,
            location = %location,
            "scraping location"
        );

        // Run each location in its own task so a panic is contained to it.
        let task = tokio::spawn({
            let source = Arc::clone(&source);
            let client = client.clone();
            let settings = Arc::clone(&settings);
            let location = location.clone();
            async move { scrape_location(source.as_ref(), &client, &location, &settings).await }
        });

        let result = match task.await {
            Ok(result) => result,
            Err(join_err) => Err(LocationFailure {
                location,
                page: 0,
                request_count: 0,
                error: ScraperError::TaskFailed(join_err.to_string()),
            }),
        };

        if tx.send(result).await.is_err() {
            tracing::debug!(worker, "result receiver dropped; worker stopping");
            break;
        }
    }
}
