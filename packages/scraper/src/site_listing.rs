//! Paginated crawler for the ministry document listing page.
//!
//! Walks the listing one page at a time (`?page=N`), classifies anchors by
//! a keyword heuristic, and yields [`CandidateDocument`]s until a page
//! produces zero candidates or the page ceiling is reached.
//!
//! The zero-candidate stop rule cannot distinguish a true end-of-listing
//! from a transient empty page; a glitch truncates that run and the next
//! scheduled cycle picks up whatever was missed.

use std::sync::Arc;

use bei_map_models::CandidateDocument;
use scraper::{Html, Selector};
use serde::Deserialize;

use crate::{PageFetcher, ScrapeError};

/// Configuration for crawling one document listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ListingConfig {
    /// URL of the first listing page.
    pub listing_url: String,
    /// Site origin used to resolve relative hrefs
    /// (e.g. `"https://www.viwanda.go.tz"`).
    pub origin: String,
    /// Bulletin-name markers matched case-sensitively against link text
    /// (e.g. `"Bei ya Mazao"`).
    pub bulletin_markers: Vec<String>,
    /// Keywords matched against lowercased link text.
    pub keywords: Vec<String>,
    /// Keywords that qualify a `.pdf` href when found in lowercased text.
    pub pdf_keywords: Vec<String>,
    /// Pagination ceiling.
    pub max_pages: u32,
    /// Delay between page fetches, in milliseconds.
    pub page_delay_ms: u64,
}

/// Outcome of one crawl pass.
///
/// A page fetch error ends the crawl but keeps the candidates collected so
/// far; callers inspect `pages_fetched` and `error` to tell a dead listing
/// (nothing fetched at all) from a partially truncated run.
#[derive(Debug)]
pub struct CrawlResult {
    /// Candidates discovered, in listing order.
    pub candidates: Vec<CandidateDocument>,
    /// Number of pages successfully fetched and parsed.
    pub pages_fetched: u32,
    /// The error that ended the crawl early, if any.
    pub error: Option<ScrapeError>,
}

impl CrawlResult {
    /// `true` when not even the first listing page could be fetched.
    #[must_use]
    pub const fn listing_unreachable(&self) -> bool {
        self.pages_fetched == 0 && self.error.is_some()
    }
}

/// Crawls the paginated document listing.
pub struct ListingCrawler {
    fetcher: Arc<dyn PageFetcher>,
    config: ListingConfig,
}

impl ListingCrawler {
    /// Creates a crawler over the given listing.
    #[must_use]
    pub fn new(fetcher: Arc<dyn PageFetcher>, config: ListingConfig) -> Self {
        Self { fetcher, config }
    }

    /// Fetches listing pages from page 1 until a page yields zero
    /// candidates, a fetch fails, or `max_pages` is reached.
    ///
    /// Not restartable; every call begins again from page 1.
    pub async fn crawl(&self) -> CrawlResult {
        self.crawl_pages(self.config.max_pages).await
    }

    /// Crawls only the first listing page (the monitor's delta check).
    pub async fn crawl_first_page(&self) -> CrawlResult {
        self.crawl_pages(1).await
    }

    async fn crawl_pages(&self, max_pages: u32) -> CrawlResult {
        let mut candidates: Vec<CandidateDocument> = Vec::new();
        let mut pages_fetched: u32 = 0;

        for page in 1..=max_pages {
            let url = page_url(&self.config.listing_url, page);
            log::debug!("Fetching listing page {page}: {url}");

            let html = match self.fetcher.fetch_text(&url).await {
                Ok(html) => html,
                Err(e) => {
                    log::error!("Listing page {page} fetch failed: {e}");
                    return CrawlResult {
                        candidates,
                        pages_fetched,
                        error: Some(e),
                    };
                }
            };
            pages_fetched += 1;

            // Parse in a non-async block (Html is not Send).
            let page_candidates = {
                let document = Html::parse_document(&html);
                let anchor_sel = Selector::parse("a[href]").unwrap_or_else(|_| unreachable!());

                document
                    .select(&anchor_sel)
                    .filter_map(|anchor| {
                        let text = collapse_whitespace(&anchor.text().collect::<String>());
                        let href = anchor.attr("href").unwrap_or_default();
                        if href.is_empty() || !self.is_price_anchor(&text, href) {
                            return None;
                        }
                        Some(CandidateDocument {
                            text,
                            url: resolve_url(&self.config.origin, href),
                            page_found: page,
                        })
                    })
                    .collect::<Vec<_>>()
            };

            if page_candidates.is_empty() {
                log::info!("No candidates on listing page {page}, stopping pagination");
                break;
            }

            log::info!(
                "Found {} candidate(s) on listing page {page}",
                page_candidates.len()
            );
            candidates.extend(page_candidates);

            if page < max_pages && self.config.page_delay_ms > 0 {
                tokio::time::sleep(std::time::Duration::from_millis(self.config.page_delay_ms))
                    .await;
            }
        }

        CrawlResult {
            candidates,
            pages_fetched,
            error: None,
        }
    }

    /// Classifies an anchor as a price-bulletin candidate.
    fn is_price_anchor(&self, text: &str, href: &str) -> bool {
        if self.config.bulletin_markers.iter().any(|m| text.contains(m)) {
            return true;
        }

        let lower = text.to_lowercase();
        if self.config.keywords.iter().any(|k| lower.contains(k)) {
            return true;
        }

        href.to_lowercase().contains(".pdf")
            && self.config.pdf_keywords.iter().any(|k| lower.contains(k))
    }
}

/// Builds the URL for a listing page; page 1 is the bare listing URL,
/// later pages append a `page` query parameter.
fn page_url(listing_url: &str, page: u32) -> String {
    if page == 1 {
        listing_url.to_owned()
    } else {
        let separator = if listing_url.contains('?') { '&' } else { '?' };
        format!("{listing_url}{separator}page={page}")
    }
}

/// Resolves an href against the site origin.
fn resolve_url(origin: &str, href: &str) -> String {
    if href.starts_with("http") {
        href.to_owned()
    } else if href.starts_with('/') {
        format!("{origin}{href}")
    } else {
        format!("{origin}/{href}")
    }
}

/// Collapses runs of whitespace (including newlines inside anchor text)
/// into single spaces.
fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
