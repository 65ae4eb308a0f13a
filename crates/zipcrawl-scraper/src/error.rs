use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    /// Transport failure: connect, TLS, timeout, or body read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// A 2xx response whose body says the server refused the session.
    #[error("session rejected by {url}: {reason}")]
    SessionRejected { url: String, reason: String },

    /// The body matched neither the entry structure nor a no-results sentinel.
    #[error("unrecognised response from {source_name} for location {location}: {reason}")]
    ParseAnomaly {
        source_name: &'static str,
        location: String,
        reason: String,
    },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("gave up after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: Box<ScraperError>,
    },

    #[error("per-location retry ceiling of {limit} reached: {last}")]
    RetryBudgetExhausted {
        limit: u32,
        #[source]
        last: Box<ScraperError>,
    },

    #[error("invalid URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("location task failed: {0}")]
    TaskFailed(String),
}

impl ScraperError {
    /// Returns `true` when the failed attempt still received an HTTP response.
    ///
    /// Responded attempts count towards a location's request total;
    /// transport failures do not.
    #[must_use]
    pub fn responded(&self) -> bool {
        matches!(
            self,
            ScraperError::UnexpectedStatus { .. } | ScraperError::SessionRejected { .. }
        )
    }
}
