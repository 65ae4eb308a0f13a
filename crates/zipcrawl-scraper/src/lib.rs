pub mod client;
pub mod error;
pub mod locator;
pub mod pool;
pub mod retry;
pub mod zipsource;

pub use client::{ClientConfig, LocatorClient, PageRequest, RawPage};
pub use error::ScraperError;
pub use locator::{
    scrape_location, CareCreditSource, LocationFailure, LocatorSource, PageEntry, ParsedPage,
    ScrapeOutcome, ScrapeSettings, StopReason, WellsFargoSource,
};
pub use pool::{spawn_pool, LocationResult};
pub use retry::RetryPolicy;
pub use zipsource::{HttpZipSource, ZipSource};
