//! CareCredit provider locator: a JSON service paged by `Page`.

use async_trait::async_trait;
use serde_json::Value;
use zipcrawl_core::Location;

use super::clean_text;
use crate::client::{LocatorClient, PageRequest, RawPage};
use crate::error::ScraperError;
use crate::locator::{LocatorSource, PageEntry, ParsedPage};

const DEFAULT_BASE_URL: &str = "https://www.carecredit.com";
const SEARCH_RADIUS: &str = "5";
const REFERER_PATH: &str =
    "/doctor-locator/results/Any-Profession/Any-Specialty//?Sort=D&Radius=5&Page=2";

const DEFAULT_HEADERS: &[(&str, &str)] = &[("Accept", "*/*"), ("Accept-Language", "en-US")];

#[derive(Debug, Clone)]
pub struct CareCreditSource {
    base_url: String,
}

impl Default for CareCreditSource {
    fn default() -> Self {
        Self::new()
    }
}

impl CareCreditSource {
    #[must_use]
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Points the source at another host (used by tests against a mock server).
    #[must_use]
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    fn page_request(&self, location: &Location, page: u32) -> PageRequest {
        PageRequest::new(format!("{}/sites/Satellite", self.base_url))
            .param("Page", page)
            .param("Radius", SEARCH_RADIUS)
            .param("Sort", "D")
            .param("d", "Touch")
            .param("location", location.as_str())
            .param("pagename", "CCGetLocatorService")
            .header("Referer", format!("{}{REFERER_PATH}", self.base_url))
            .header("X-Requested-With", "XMLHttpRequest")
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
impl LocatorSource for CareCreditSource {
    fn name(&self) -> &'static str {
        "carecredit"
    }

    fn origin(&self) -> &str {
        &self.base_url
    }

    fn default_headers(&self) -> &'static [(&'static str, &'static str)] {
        DEFAULT_HEADERS
    }

    // The service pages until it runs dry; short pages are not a stop signal.
    fn full_page_size(&self) -> Option<usize> {
        None
    }

    async fn fetch_page(
        &self,
        client: &LocatorClient,
        location: &Location,
        page: u32,
    ) -> Result<RawPage, ScraperError> {
        client.get(&self.page_request(location, page)).await
    }

    fn parse_page(&self, location: &Location, page: &RawPage) -> Result<ParsedPage, ScraperError> {
        let body: Value = serde_json::from_str(&page.body)
            .map_err(|e| self.anomaly(location, format!("body is not JSON: {e}")))?;

        let results = match body.get("results") {
            None | Some(Value::Null) => return Ok(ParsedPage::NoResults),
            Some(Value::Array(results)) => results,
            Some(other) => {
                return Err(self.anomaly(
                    location,
                    format!("`results` is not an array: {}", json_kind(other)),
                ))
            }
        };

        Ok(ParsedPage::Entries(results.iter().map(entry_from_json).collect()))
    }
}

fn entry_from_json(result: &Value) -> PageEntry {
    let specialties = result
        .get("specialties")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(|item| text_field(item, "Specialty"))
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(", ")
        })
        .unwrap_or_default();

    PageEntry {
        zipcode: text_field(result, "zipcode"),
        name: text_field(result, "name"),
        address: text_field(result, "address1"),
        city: text_field(result, "city"),
        state: text_field(result, "state"),
        phone: text_field(result, "phone"),
        specialties,
    }
}

/// Reads `key` as text. Numbers are rendered as-is; anything else is empty.
fn text_field(value: &Value, key: &str) -> String {
    match value.get(key) {
        Some(Value::String(s)) => clean_text(s),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
