#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Web scraping for the price pipeline.
//!
//! Provides the [`PageFetcher`] trait (the HTTP seam, so crawling logic can
//! be exercised against canned pages in tests) and two concrete scrapers:
//! the paginated listing crawler ([`site_listing`]) and the live marketplace
//! table scraper ([`live_market`]).
//!
//! This crate is a pure scraping library with no awareness of the price
//! store. It discovers candidate documents and extracts live price records;
//! downloading, extraction, and persistence live elsewhere.

pub mod live_market;
pub mod site_listing;

use async_trait::async_trait;

/// Browser identity sent with every outbound request.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Per-request timeout for listing pages, documents, and the marketplace.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Connect timeout for outbound requests.
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Errors that can occur during scraping operations.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    /// An HTTP request failed (network error or non-2xx status).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Parsing the response body failed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A downloaded response body plus the metadata callers care about.
#[derive(Debug, Clone)]
pub struct FetchedPayload {
    /// Raw response bytes.
    pub bytes: Vec<u8>,
    /// Content-Type header reported by the server.
    pub content_type: Option<String>,
}

/// The HTTP seam used by every fetching component.
///
/// Production code uses [`HttpFetcher`]; tests substitute a stub serving
/// canned pages so crawl behaviour can be asserted without a network.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches a URL and returns the response body as text.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError`] on a network error or non-2xx status.
    async fn fetch_text(&self, url: &str) -> Result<String, ScrapeError>;

    /// Fetches a URL and returns the raw response bytes with content type.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError`] on a network error or non-2xx status.
    async fn fetch_bytes(&self, url: &str) -> Result<FetchedPayload, ScrapeError>;
}

/// [`PageFetcher`] backed by a shared [`reqwest::Client`] with the fixed
/// browser user-agent and explicit timeouts.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Creates a fetcher with the pipeline's fixed client identity.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Http`] if the client cannot be built.
    pub fn new() -> Result<Self, ScrapeError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .connect_timeout(std::time::Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, ScrapeError> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }

    async fn fetch_bytes(&self, url: &str) -> Result<FetchedPayload, ScrapeError> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let bytes = response.bytes().await?.to_vec();
        Ok(FetchedPayload {
            bytes,
            content_type,
        })
    }
}
