use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use super::*;
use crate::client::ClientConfig;

/// One scripted response for [`ScriptedSource`].
enum Step {
    Page(ParsedPage),
    Fail(ScraperError),
    Anomaly,
}

/// A locator source that replays a fixed script instead of talking HTTP.
struct ScriptedSource {
    steps: Mutex<VecDeque<Step>>,
    pending: Mutex<Option<ParsedPage>>,
    full_page_size: Option<usize>,
    fetches: AtomicU32,
}

impl ScriptedSource {
    fn new(full_page_size: Option<usize>, steps: Vec<Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            pending: Mutex::new(None),
            full_page_size,
            fetches: AtomicU32::new(0),
        }
    }

    fn fetches(&self) -> u32 {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LocatorSource for ScriptedSource {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn origin(&self) -> &str {
        "http://locator.test"
    }

    fn full_page_size(&self) -> Option<usize> {
        self.full_page_size
    }

    async fn fetch_page(
        &self,
        _client: &LocatorClient,
        _location: &Location,
        page: u32,
    ) -> Result<RawPage, ScraperError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let step = self
            .steps
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Step::Page(ParsedPage::Entries(vec![])));
        let body = match step {
            Step::Fail(err) => return Err(err),
            Step::Page(parsed) => {
                *self.pending.lock().unwrap() = Some(parsed);
                "page"
            }
            Step::Anomaly => "anomaly",
        };
        Ok(RawPage {
            url: format!("http://locator.test/?page={page}"),
            status: 200,
            body: body.to_owned(),
        })
    }

    fn parse_page(&self, location: &Location, page: &RawPage) -> Result<ParsedPage, ScraperError> {
        if page.body == "anomaly" {
            return Err(ScraperError::ParseAnomaly {
                source_name: "scripted",
                location: location.to_string(),
                reason: "unrecognised body".to_owned(),
            });
        }
        Ok(self
            .pending
            .lock()
            .unwrap()
            .take()
            .unwrap_or(ParsedPage::NoResults))
    }
}

fn entry(zip: &str, name: &str) -> PageEntry {
    PageEntry {
        zipcode: zip.to_owned(),
        name: name.to_owned(),
        address: "1 Main St".to_owned(),
        city: "Los Angeles".to_owned(),
        state: "CA".to_owned(),
        phone: "555-0100".to_owned(),
        specialties: String::new(),
    }
}

fn matching(n: usize) -> Vec<PageEntry> {
    (0..n).map(|i| entry("90022", &format!("Office {i}"))).collect()
}

fn page(entries: Vec<PageEntry>) -> Step {
    Step::Page(ParsedPage::Entries(entries))
}

fn status_err() -> ScraperError {
    ScraperError::UnexpectedStatus {
        status: 500,
        url: "http://locator.test".to_owned(),
    }
}

fn settings() -> ScrapeSettings {
    ScrapeSettings {
        retry: RetryPolicy {
            max_retries: 2,
            backoff_base_ms: 0,
        },
        ..ScrapeSettings::default()
    }
}

fn client() -> LocatorClient {
    LocatorClient::new(&ClientConfig::default(), "http://locator.test").unwrap()
}

fn location() -> Location {
    Location::new("90022")
}

#[tokio::test]
async fn zero_matches_returns_empty_records_and_counts_the_request() {
    let source = ScriptedSource::new(None, vec![page(vec![])]);
    let outcome = scrape_location(&source, &client(), &location(), &settings())
        .await
        .unwrap();
    assert!(outcome.records.is_empty());
    assert_eq!(outcome.request_count, 1);
    assert_eq!(outcome.stop_reason, StopReason::EmptyPage);
}

#[tokio::test]
async fn no_results_sentinel_is_an_empty_outcome() {
    let source = ScriptedSource::new(Some(25), vec![Step::Page(ParsedPage::NoResults)]);
    let outcome = scrape_location(&source, &client(), &location(), &settings())
        .await
        .unwrap();
    assert!(outcome.records.is_empty());
    assert!(outcome.request_count >= 1);
    assert_eq!(outcome.stop_reason, StopReason::NoResults);
    assert_eq!(source.fetches(), 1);
}

#[tokio::test]
async fn full_page_continues_and_partial_page_stops() {
    let source = ScriptedSource::new(
        Some(25),
        vec![page(matching(25)), page(matching(10)), page(matching(25))],
    );
    let outcome = scrape_location(&source, &client(), &location(), &settings())
        .await
        .unwrap();
    assert_eq!(outcome.records.len(), 35);
    assert_eq!(outcome.pages, 2);
    assert_eq!(outcome.request_count, 2);
    assert_eq!(outcome.stop_reason, StopReason::PartialPage);
    assert_eq!(source.fetches(), 2, "third page must never be requested");
}

#[tokio::test]
async fn partial_first_page_stops_after_page_one() {
    let source = ScriptedSource::new(Some(25), vec![page(matching(10)), page(matching(25))]);
    let outcome = scrape_location(&source, &client(), &location(), &settings())
        .await
        .unwrap();
    assert_eq!(outcome.records.len(), 10);
    assert_eq!(source.fetches(), 1);
}

#[tokio::test]
async fn five_consecutive_mismatches_abort_the_page_and_pagination() {
    let mut entries = vec![entry("90022", "A"), entry("90022", "B")];
    entries.extend((0..5).map(|i| entry("90023", &format!("Far {i}"))));
    // Would match, but sits after the abort point.
    entries.push(entry("90022", "C"));
    let source = ScriptedSource::new(None, vec![page(entries), page(matching(3))]);

    let outcome = scrape_location(&source, &client(), &location(), &settings())
        .await
        .unwrap();

    let names: Vec<&str> = outcome.records.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["A", "B"]);
    assert_eq!(outcome.stop_reason, StopReason::MismatchThreshold);
    assert_eq!(source.fetches(), 1);
}

#[tokio::test]
async fn four_mismatches_then_a_match_resets_the_counter() {
    let mut entries: Vec<PageEntry> = (0..4).map(|i| entry("10001", &format!("Far {i}"))).collect();
    entries.push(entry("90022", "Near"));
    entries.extend((0..4).map(|i| entry("10001", &format!("Farther {i}"))));
    let source = ScriptedSource::new(None, vec![page(entries), page(vec![])]);

    let outcome = scrape_location(&source, &client(), &location(), &settings())
        .await
        .unwrap();

    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.stop_reason, StopReason::EmptyPage);
    assert_eq!(source.fetches(), 2);
}

#[tokio::test]
async fn mismatch_counter_carries_across_pages() {
    let first = vec![
        entry("90022", "Near"),
        entry("10001", "Far 1"),
        entry("10001", "Far 2"),
    ];
    let second = vec![
        entry("10001", "Far 3"),
        entry("10001", "Far 4"),
        entry("10001", "Far 5"),
    ];
    let source = ScriptedSource::new(Some(3), vec![page(first), page(second), page(matching(3))]);

    let outcome = scrape_location(&source, &client(), &location(), &settings())
        .await
        .unwrap();

    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.stop_reason, StopReason::MismatchThreshold);
    assert_eq!(source.fetches(), 2);
}

#[tokio::test]
async fn records_carry_the_queried_location() {
    let source = ScriptedSource::new(Some(25), vec![page(matching(1))]);
    let outcome = scrape_location(&source, &client(), &location(), &settings())
        .await
        .unwrap();
    let record = &outcome.records[0];
    assert_eq!(record.location, "90022");
    assert_eq!(record.zipcode, "90022");
    assert_eq!(record.name, "Office 0");
}

#[tokio::test]
async fn page_cap_stops_an_endless_locator() {
    let steps = (0..5).map(|_| page(matching(3))).collect();
    let source = ScriptedSource::new(Some(3), steps);
    let settings = ScrapeSettings {
        max_pages: 3,
        ..settings()
    };
    let outcome = scrape_location(&source, &client(), &location(), &settings)
        .await
        .unwrap();
    assert_eq!(outcome.records.len(), 9);
    assert_eq!(outcome.pages, 3);
    assert_eq!(outcome.stop_reason, StopReason::PageCap);
    assert_eq!(source.fetches(), 3);
}

#[tokio::test]
async fn status_retry_counts_every_response() {
    let source = ScriptedSource::new(None, vec![Step::Fail(status_err()), page(vec![])]);
    let outcome = scrape_location(&source, &client(), &location(), &settings())
        .await
        .unwrap();
    assert_eq!(source.fetches(), 2);
    assert_eq!(outcome.request_count, 2);
}

#[tokio::test]
async fn transport_failure_then_success_counts_one_request() {
    let transport = reqwest::Client::new()
        .get("http://0.0.0.0:1")
        .send()
        .await
        .unwrap_err();
    let source = ScriptedSource::new(
        None,
        vec![Step::Fail(ScraperError::Http(transport)), page(vec![])],
    );
    let outcome = scrape_location(&source, &client(), &location(), &settings())
        .await
        .unwrap();
    assert_eq!(source.fetches(), 2);
    assert_eq!(outcome.request_count, 1);
}

#[tokio::test]
async fn exhausted_retries_fail_the_location_and_keep_the_count() {
    let source = ScriptedSource::new(
        None,
        vec![
            page(matching(2)),
            Step::Fail(status_err()),
            Step::Fail(status_err()),
            Step::Fail(status_err()),
        ],
    );
    let failure = scrape_location(&source, &client(), &location(), &settings())
        .await
        .unwrap_err();
    assert_eq!(failure.page, 2);
    assert_eq!(failure.request_count, 4);
    assert!(matches!(
        failure.error,
        ScraperError::RetriesExhausted { attempts: 3, .. }
    ));
}

#[tokio::test]
async fn location_retry_ceiling_spans_pages() {
    let source = ScriptedSource::new(
        Some(2),
        vec![
            Step::Fail(status_err()),
            page(matching(2)),
            Step::Fail(status_err()),
        ],
    );
    let settings = ScrapeSettings {
        max_location_retries: Some(1),
        ..settings()
    };
    let failure = scrape_location(&source, &client(), &location(), &settings)
        .await
        .unwrap_err();
    assert_eq!(failure.page, 2);
    assert!(matches!(
        failure.error,
        ScraperError::RetryBudgetExhausted { limit: 1, .. }
    ));
}

#[tokio::test]
async fn parse_anomaly_fails_the_location() {
    let source = ScriptedSource::new(None, vec![Step::Anomaly]);
    let failure = scrape_location(&source, &client(), &location(), &settings())
        .await
        .unwrap_err();
    assert_eq!(failure.page, 1);
    assert_eq!(failure.request_count, 1);
    assert!(matches!(failure.error, ScraperError::ParseAnomaly { .. }));
}

#[test]
fn stop_rules_apply_in_order() {
    assert_eq!(
        stop_after_page(true, 25, Some(25)),
        Some(StopReason::MismatchThreshold)
    );
    assert_eq!(
        stop_after_page(false, 10, Some(25)),
        Some(StopReason::PartialPage)
    );
    assert_eq!(stop_after_page(false, 0, None), Some(StopReason::EmptyPage));
    assert_eq!(stop_after_page(false, 25, Some(25)), None);
    assert_eq!(stop_after_page(false, 7, None), None);
}
