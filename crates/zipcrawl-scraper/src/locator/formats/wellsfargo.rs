//! Wells Fargo retail-services locator: server-rendered HTML.
//!
//! Page 1 is a landing search that opens a session; later pages are fetched
//! by result offset within that session, so the worker's cookie jar must
//! carry over between pages.

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use zipcrawl_core::Location;

use super::clean_text;
use crate::client::{LocatorClient, PageRequest, RawPage};
use crate::error::ScraperError;
use crate::locator::{LocatorSource, PageEntry, ParsedPage};

const DEFAULT_BASE_URL: &str = "https://retailservices.wellsfargo.com";
const PAGE_SIZE: usize = 25;
const SEARCH_DISTANCE: &str = "75";

const DEFAULT_HEADERS: &[(&str, &str)] = &[
    (
        "Accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
    ),
    ("Accept-Language", "en-US"),
    ("Cache-Control", "no-cache"),
];

/// Body text of a session the server refused to serve.
const SESSION_REJECTED: &str = "The transaction failed.";

/// Body texts that mean "nothing near this location".
const NO_RESULT_SENTINELS: [&str; 3] = [
    "No results matched your search",
    "Please enter a valid ZIP code and search again.",
    "Something went wrong. We care about your expe",
];

#[derive(Debug, Clone)]
pub struct WellsFargoSource {
    base_url: String,
}

impl Default for WellsFargoSource {
    fn default() -> Self {
        Self::new()
    }
}

impl WellsFargoSource {
    #[must_use]
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    #[must_use]
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    fn page_request(&self, location: &Location, page: u32) -> PageRequest {
        if page <= 1 {
            PageRequest::new(format!("{}/locator/WFHALanding", self.base_url))
                .param("searchAddress", location.as_str())
                .param("searchDistance", SEARCH_DISTANCE)
                .param("segment", "")
                .param("merchantName", "")
                .param("userAgent", "false")
        } else {
            let offset = (page as usize - 1) * PAGE_SIZE;
            PageRequest::new(format!("{}/locator/wfhapageMap", self.base_url))
                .param("pageIndex", offset)
        }
    }

    fn anomaly(&self, location: &Location, reason: String) -> ScraperError {
        ScraperError::ParseAnomaly {
            source_name: self.name(),
            location: location.to_string(),
            reason,
        }
    }
}

#[async_trait]
impl LocatorSource for WellsFargoSource {
    fn name(&self) -> &'static str {
        "wellsfargo"
    }

    fn origin(&self) -> &str {
        &self.base_url
    }

    fn default_headers(&self) -> &'static [(&'static str, &'static str)] {
        DEFAULT_HEADERS
    }

    fn full_page_size(&self) -> Option<usize> {
        Some(PAGE_SIZE)
    }

    async fn fetch_page(
        &self,
        client: &LocatorClient,
        location: &Location,
        page: u32,
    ) -> Result<RawPage, ScraperError> {
        let raw = client.get(&self.page_request(location, page)).await?;
        if raw.body.contains(SESSION_REJECTED) {
            // The rejected session's cookies would only be rejected again.
            client.reset_session()?;
            return Err(ScraperError::SessionRejected {
                url: raw.url,
                reason: SESSION_REJECTED.to_owned(),
            });
        }
        Ok(raw)
    }

    fn parse_page(&self, location: &Location, page: &RawPage) -> Result<ParsedPage, ScraperError> {
        let selector = |css: &str| {
            Selector::parse(css)
                .map_err(|e| self.anomaly(location, format!("invalid selector {css}: {e}")))
        };
        let result_sel = selector(".aResult")?;
        let fields = EntrySelectors {
            zipcode: selector(".postal-code")?,
            name: selector(".fn-title")?,
            street: selector(".street-address")?,
            city: selector(".locality")?,
            state: selector(".region")?,
            phone: selector(".tel a")?,
            heading: selector(".fn-heading")?,
        };

        let doc = Html::parse_document(&page.body);
        let entries: Vec<PageEntry> = doc
            .select(&result_sel)
            .map(|el| fields.entry(el))
            .collect();

        if !entries.is_empty() {
            return Ok(ParsedPage::Entries(entries));
        }
        if NO_RESULT_SENTINELS.iter().any(|s| page.body.contains(s)) {
            return Ok(ParsedPage::NoResults);
        }
        Err(self.anomaly(
            location,
            "no result entries and no recognised no-results message".to_owned(),
        ))
    }
}

struct EntrySelectors {
    zipcode: Selector,
    name: Selector,
    street: Selector,
    city: Selector,
    state: Selector,
    phone: Selector,
    heading: Selector,
}

impl EntrySelectors {
    fn entry(&self, el: ElementRef<'_>) -> PageEntry {
        PageEntry {
            zipcode: first_text(el, &self.zipcode),
            name: first_text(el, &self.name),
            address: first_text(el, &self.street),
            city: first_text(el, &self.city),
            state: first_text(el, &self.state),
            phone: first_text(el, &self.phone),
            // The last heading in an entry lists the merchant's specialties.
            specialties: el
                .select(&self.heading)
                .last()
                .map(element_text)
                .unwrap_or_default(),
        }
    }
}

fn first_text(el: ElementRef<'_>, selector: &Selector) -> String {
    el.select(selector)
        .next()
        .map(element_text)
        .unwrap_or_default()
}

fn element_text(el: ElementRef<'_>) -> String {
    clean_text(&el.text().collect::<String>())
}
