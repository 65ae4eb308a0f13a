//! HTTP client shared by the locator sources.
//!
//! A [`LocatorClient`] is built once per pool worker from an injected
//! [`ClientConfig`]. It owns its own cookie jar, so session state picked up
//! on page 1 of a search follows the worker through the later pages.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use reqwest::cookie::Jar;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Url};

use crate::error::ScraperError;
use crate::locator::LocatorSource;

/// Headers, cookies, and timeouts applied to every locator request.
#[derive(Clone, Default)]
pub struct ClientConfig {
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub user_agent: String,
    /// Extra default headers as `(name, value)` pairs.
    pub headers: Vec<(String, String)>,
    /// Seed cookies in `name=value; name2=value2` form.
    pub cookies: Option<String>,
}

impl ClientConfig {
    #[must_use]
    pub fn from_app_config(config: &zipcrawl_core::AppConfig) -> Self {
        Self {
            request_timeout_secs: config.scraper_request_timeout_secs,
            connect_timeout_secs: config.scraper_connect_timeout_secs,
            user_agent: config.scraper_user_agent.clone(),
            headers: Vec::new(),
            cookies: config.scraper_cookies.clone(),
        }
    }

    /// Adds a default header. A later entry with the same name replaces an earlier one.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("headers", &self.headers)
            .field("cookies", &self.cookies.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

/// One locator request: endpoint, query parameters, and per-request headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(&'static str, String)>,
}

impl PageRequest {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
        }
    }

    #[must_use]
    pub fn param(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_owned(), value.to_string()));
        self
    }

    #[must_use]
    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }
}

/// A successful (2xx) response body.
#[derive(Debug, Clone)]
pub struct RawPage {
    pub url: String,
    pub status: u16,
    pub body: String,
}

/// Per-worker HTTP client with a private cookie jar.
///
/// Clones share one session; [`LocatorClient::reset_session`] swaps it for a
/// fresh one in every clone.
#[derive(Clone)]
pub struct LocatorClient {
    session: Arc<RwLock<Client>>,
    config: Arc<ClientConfig>,
    origin: Url,
}

impl LocatorClient {
    /// Builds a client from `config`, seeding its cookies for `cookie_origin`.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::InvalidUrl`] if `cookie_origin` does not parse or a
    ///   configured header is not a valid header name/value.
    /// - [`ScraperError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(config: &ClientConfig, cookie_origin: &str) -> Result<Self, ScraperError> {
        let origin = Url::parse(cookie_origin).map_err(|e| ScraperError::InvalidUrl {
            url: cookie_origin.to_owned(),
            reason: e.to_string(),
        })?;
        let client = build_session(config, &origin)?;
        Ok(Self {
            session: Arc::new(RwLock::new(client)),
            config: Arc::new(config.clone()),
            origin,
        })
    }

    /// Builds a client for `source`: its default headers first, then the
    /// configured ones, which win on a name clash.
    ///
    /// # Errors
    ///
    /// Same as [`LocatorClient::new`].
    pub fn for_source(config: &ClientConfig, source: &dyn LocatorSource) -> Result<Self, ScraperError> {
        let mut merged = source.default_headers().iter().fold(
            ClientConfig {
                headers: Vec::new(),
                ..config.clone()
            },
            |merged, (name, value)| merged.with_header(name, value),
        );
        merged.headers.extend(config.headers.iter().cloned());
        Self::new(&merged, source.origin())
    }

    /// Drops the current session (cookie jar included) and starts a new one
    /// seeded only from the configured cookies.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the new `reqwest::Client` cannot be built.
    pub fn reset_session(&self) -> Result<(), ScraperError> {
        let fresh = build_session(&self.config, &self.origin)?;
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = fresh;
        tracing::debug!(origin = %self.origin, "locator session reset");
        Ok(())
    }

    fn current(&self) -> Client {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Issues a GET for `request` and returns the body of a 2xx response.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::Http`] on transport failure or an unreadable body.
    /// - [`ScraperError::UnexpectedStatus`] for any non-2xx status.
    pub async fn get(&self, request: &PageRequest) -> Result<RawPage, ScraperError> {
        let mut builder = self.current().get(&request.url).query(&request.query);
        for (name, value) in &request.headers {
            builder = builder.header(*name, value.as_str());
        }
        let response = builder.send().await?;
        let status = response.status();
        let url = response.url().to_string();

        if !status.is_success() {
            return Err(ScraperError::UnexpectedStatus {
                status: status.as_u16(),
                url,
            });
        }

        let body = response.text().await?;
        Ok(RawPage {
            url,
            status: status.as_u16(),
            body,
        })
    }
}

fn build_session(config: &ClientConfig, origin: &Url) -> Result<Client, ScraperError> {
    let jar = Arc::new(Jar::default());
    if let Some(cookies) = &config.cookies {
        for pair in cookies.split(';').map(str::trim).filter(|p| p.contains('=')) {
            jar.add_cookie_str(pair, origin);
        }
    }

    let mut headers = HeaderMap::new();
    for (name, value) in &config.headers {
        let invalid = |reason: String| ScraperError::InvalidUrl {
            url: origin.to_string(),
            reason: format!("header {name}: {reason}"),
        };
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| invalid(e.to_string()))?;
        let value = HeaderValue::from_str(value).map_err(|e| invalid(e.to_string()))?;
        headers.insert(name, value);
    }

    let mut builder = Client::builder()
        .cookie_provider(jar)
        .default_headers(headers);
    if config.request_timeout_secs > 0 {
        builder = builder.timeout(Duration::from_secs(config.request_timeout_secs));
    }
    if config.connect_timeout_secs > 0 {
        builder = builder.connect_timeout(Duration::from_secs(config.connect_timeout_secs));
    }
    if !config.user_agent.is_empty() {
        builder = builder.user_agent(config.user_agent.clone());
    }
    Ok(builder.build()?)
}
