//! Domain types for the per-location scrape loop.

use zipcrawl_core::{Location, ResultRecord};

use crate::error::ScraperError;

/// One entry parsed from a locator page, before location matching.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageEntry {
    /// Postal code the provider reports for this entry; compared to the location.
    pub zipcode: String,
    pub name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub phone: String,
    pub specialties: String,
}

impl PageEntry {
    /// Converts a matched entry into the record written to the result file.
    #[must_use]
    pub fn into_record(self, location: &Location) -> ResultRecord {
        ResultRecord {
            location: location.as_str().to_owned(),
            name: self.name,
            address: self.address,
            city: self.city,
            state: self.state,
            zipcode: self.zipcode,
            phone: self.phone,
            specialties: self.specialties,
        }
    }
}

/// A parsed locator response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedPage {
    /// The page carried result entries (possibly zero).
    Entries(Vec<PageEntry>),
    /// The provider answered with a recognised "no results" message.
    NoResults,
}

/// Why pagination stopped for a location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Too many consecutive entries for other locations.
    MismatchThreshold,
    /// The page held fewer entries than a full page.
    PartialPage,
    /// The page held no entries at all.
    EmptyPage,
    /// The provider returned its no-results sentinel.
    NoResults,
    /// The hard page cap was reached.
    PageCap,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::MismatchThreshold => write!(f, "mismatch_threshold"),
            StopReason::PartialPage => write!(f, "partial_page"),
            StopReason::EmptyPage => write!(f, "empty_page"),
            StopReason::NoResults => write!(f, "no_results"),
            StopReason::PageCap => write!(f, "page_cap"),
        }
    }
}

/// Everything one location produced.
#[derive(Debug, Clone)]
pub struct ScrapeOutcome {
    pub location: Location,
    pub records: Vec<ResultRecord>,
    /// Attempts that received an HTTP response.
    pub request_count: u32,
    pub pages: u32,
    pub stop_reason: StopReason,
}

/// A location that could not be scraped. Records from earlier pages are
/// discarded; the requests already spent are kept for the batch total.
#[derive(Debug, thiserror::Error)]
#[error("location {location} failed on page {page} after {request_count} requests: {error}")]
pub struct LocationFailure {
    pub location: Location,
    pub page: u32,
    pub request_count: u32,
    #[source]
    pub error: ScraperError,
}
