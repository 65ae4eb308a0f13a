//! Geocoding provider that supplies the ZIP code list.

use async_trait::async_trait;
use zipcrawl_core::ZipRecord;

use crate::client::{ClientConfig, LocatorClient, PageRequest};
use crate::error::ScraperError;
use crate::retry::{retry_with_backoff, RetryBudget, RetryPolicy};

/// Anything that can enumerate (city, state, zip, zip-type) tuples.
#[async_trait]
pub trait ZipSource: Send + Sync {
    async fn fetch_zipcodes(&self) -> Result<Vec<ZipRecord>, ScraperError>;
}

/// Fetches a JSON array of ZIP records from a configured URL.
///
/// Each element needs `major_city` (or `city`), `state`, and `zipcode`;
/// `zipcode_type` is optional.
pub struct HttpZipSource {
    client: LocatorClient,
    url: String,
    retry: RetryPolicy,
}

impl HttpZipSource {
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidUrl`] if `url` does not parse, or
    /// [`ScraperError::Http`] if the client cannot be built.
    pub fn new(config: &ClientConfig, url: &str, retry: RetryPolicy) -> Result<Self, ScraperError> {
        Ok(Self {
            client: LocatorClient::new(config, url)?,
            url: url.to_owned(),
            retry,
        })
    }
}

#[async_trait]
impl ZipSource for HttpZipSource {
    async fn fetch_zipcodes(&self) -> Result<Vec<ZipRecord>, ScraperError> {
        let request = PageRequest::new(self.url.clone()).header("Accept", "application/json");
        let mut budget = RetryBudget::new(None);
        let raw = retry_with_backoff(&self.retry, &mut budget, || self.client.get(&request))
            .await
            .result?;

        let records: Vec<ZipRecord> =
            serde_json::from_str(&raw.body).map_err(|source| ScraperError::Deserialize {
                context: format!("ZIP list from {}", self.url),
                source,
            })?;

        tracing::info!(url = %self.url, count = records.len(), "fetched ZIP code list");
        Ok(records)
    }
}
