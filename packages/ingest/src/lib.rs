#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Composition root for the price ingestion pipeline.
//!
//! [`ScrapeOrchestrator`] wires the listing crawler, document fetcher,
//! PDF extractor, price-field extractor, quality scorer, and store into
//! one "scrape all known sources" operation, runnable as a one-shot
//! historical backfill or a recurring daily job. [`monitor`] adds the
//! continuous new-document poll loop, and [`PricePipeline`] is the facade
//! the API layer calls.

pub mod monitor;

use std::path::PathBuf;
use std::sync::Arc;

use bei_map_models::{
    CandidateDocument, LatestPrices, LivePriceRecord, LivePriceSummary, PriceDocument,
    ScrapeReport,
};
use bei_map_scraper::live_market::LiveMarketScraper;
use bei_map_scraper::site_listing::ListingCrawler;
use bei_map_scraper::PageFetcher;
use bei_map_source::download::DocumentFetcher;
use bei_map_source::registry::SourceRegistry;
use bei_map_source::{SourceError, dates, prices, quality};
use bei_map_store::{InsertOutcome, PriceStore, StoreError};
use chrono::NaiveDate;

use crate::monitor::{DocumentMonitor, MonitorError};

/// Errors that abort an entire orchestrator run (as opposed to
/// candidate-local failures, which are logged and skipped).
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// The store rejected a write.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Composes the scraping components into full pipeline runs.
pub struct ScrapeOrchestrator {
    registry: SourceRegistry,
    fetcher: Arc<dyn PageFetcher>,
    store: Arc<dyn PriceStore>,
    download_dir: PathBuf,
}

impl ScrapeOrchestrator {
    /// Creates an orchestrator over the given registry, HTTP seam, and
    /// store. Downloaded binaries are cached under `download_dir`.
    pub fn new(
        registry: SourceRegistry,
        fetcher: Arc<dyn PageFetcher>,
        store: Arc<dyn PriceStore>,
        download_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            registry,
            fetcher,
            store,
            download_dir: download_dir.into(),
        }
    }

    /// The configured source registry.
    #[must_use]
    pub const fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    pub(crate) fn crawler(&self) -> ListingCrawler {
        ListingCrawler::new(self.fetcher.clone(), self.registry.bulletin.listing.clone())
    }

    fn document_fetcher(&self) -> DocumentFetcher {
        DocumentFetcher::new(self.fetcher.clone(), &self.download_dir)
    }

    /// Downloads, extracts, prices, and scores one dated candidate.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the download or cache write fails.
    /// Extraction failures degrade to empty content (quality 0.0); the
    /// binary is on disk and provenance is still worth recording.
    pub(crate) async fn process_candidate(
        &self,
        candidate: &CandidateDocument,
        date: NaiveDate,
    ) -> Result<PriceDocument, SourceError> {
        let filename = self.registry.bulletin.filename_for(date);
        let fetched = self
            .document_fetcher()
            .fetch(&candidate.url, &filename)
            .await?;

        let mut extracted = bei_map_pdf::extract(&fetched.bytes);
        extracted.prices = prices::extract_prices(&extracted.text_content, &self.registry.crops);
        let quality_score = quality::score(&extracted);

        log::info!(
            "Processed {} ({date}): {} price(s), {} table(s), quality {quality_score:.1}",
            candidate.url,
            extracted.prices.len(),
            extracted.tables.len(),
        );

        Ok(PriceDocument {
            date,
            source: self.registry.bulletin.name.clone(),
            url: candidate.url.clone(),
            extracted,
            quality_score,
            file_path: fetched.file_path.display().to_string(),
            file_size: fetched.file_size,
            content_type: fetched.content_type,
            page_found: candidate.page_found,
            scraped_at: chrono::Utc::now(),
        })
    }

    /// Crawls the full paginated listing and processes every candidate
    /// with a resolvable date.
    ///
    /// Candidate-local failures (download error, unresolvable date) are
    /// logged and skipped; a crawl aborted by a page fetch error still
    /// contributes the candidates collected before the failure.
    pub async fn scrape_bulletins(&self) -> Vec<PriceDocument> {
        let result = self.crawler().crawl().await;
        if let Some(e) = &result.error {
            log::error!(
                "Listing crawl ended early after {} page(s): {e}",
                result.pages_fetched
            );
        }

        let mut documents = Vec::new();

        for candidate in &result.candidates {
            let Some(date) = dates::extract_bulletin_date(&candidate.text) else {
                log::warn!("Could not extract date from {:?}, dropping", candidate.text);
                continue;
            };

            match self.process_candidate(candidate, date).await {
                Ok(document) => documents.push(document),
                Err(e) => log::error!("Failed to process {}: {e}", candidate.url),
            }
        }

        log::info!(
            "Bulletin scrape complete: {} document(s) from {} candidate(s)",
            documents.len(),
            result.candidates.len()
        );
        documents
    }

    /// Scrapes the live marketplace page. A failure is logged and yields
    /// an empty batch; the live source never aborts a combined run.
    pub async fn scrape_live_market(&self) -> Vec<LivePriceRecord> {
        let scraper = LiveMarketScraper::new(
            self.fetcher.clone(),
            self.registry.live_market.market.clone(),
        );
        match scraper.scrape().await {
            Ok(records) => records,
            Err(e) => {
                log::error!("Live market scrape failed: {e}");
                Vec::new()
            }
        }
    }

    /// Scrapes every configured source.
    pub async fn scrape_all_sources(&self) -> (Vec<PriceDocument>, Vec<LivePriceRecord>) {
        let documents = self.scrape_bulletins().await;
        let live = self.scrape_live_market().await;
        log::info!(
            "Collected {} document(s) and {} live record(s)",
            documents.len(),
            live.len()
        );
        (documents, live)
    }

    /// Persists documents through the natural-key check; duplicates are
    /// logged and skipped, never updated. Returns `(inserted, skipped)`.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Store`] if the store itself fails.
    pub async fn save_documents(
        &self,
        documents: Vec<PriceDocument>,
    ) -> Result<(usize, usize), IngestError> {
        let mut inserted = 0;
        let mut skipped = 0;

        for document in documents {
            let date = document.date;
            let source = document.source.clone();
            match self.store.insert_document_if_new(document).await? {
                InsertOutcome::Inserted => {
                    log::info!("Saved prices for {date} from {source}");
                    inserted += 1;
                }
                InsertOutcome::Duplicate => {
                    log::info!("Prices for {date} from {source} already exist");
                    skipped += 1;
                }
            }
        }

        Ok((inserted, skipped))
    }

    /// One full scrape-and-persist pass over all sources.
    async fn run_scraping(&self) -> Result<ScrapeReport, IngestError> {
        let (documents, live) = self.scrape_all_sources().await;
        let documents_found = documents.len();
        let (documents_inserted, documents_skipped) = self.save_documents(documents).await?;
        let live_records = usize::try_from(self.store.append_live_records(live).await?)
            .unwrap_or(usize::MAX);

        Ok(ScrapeReport {
            documents_found,
            documents_inserted,
            documents_skipped,
            live_records,
        })
    }

    /// The recurring-schedule entry point. Idempotent with respect to
    /// already-ingested documents.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError`] on a store failure.
    pub async fn run_daily_scraping(&self) -> Result<ScrapeReport, IngestError> {
        log::info!("Starting daily multi-source price scraping...");
        let report = self.run_scraping().await?;
        log::info!(
            "Daily scraping complete: {} found, {} inserted, {} skipped, {} live record(s)",
            report.documents_found,
            report.documents_inserted,
            report.documents_skipped,
            report.live_records
        );
        Ok(report)
    }

    /// The one-shot historical backfill entry point, run against the full
    /// paginated listing.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError`] on a store failure.
    pub async fn run_historical_scraping(&self) -> Result<ScrapeReport, IngestError> {
        log::info!("Starting historical scraping for all past price data...");
        let report = self.run_scraping().await?;
        log::info!(
            "Historical scraping complete with {} document(s)",
            report.documents_inserted
        );
        Ok(report)
    }

    /// Runs the daily scrape on a fixed interval, forever. Failures are
    /// logged; the next cycle is the retry.
    pub async fn run_daily_schedule(&self, interval: std::time::Duration) {
        log::info!(
            "Daily scraping scheduled every {}s",
            interval.as_secs()
        );
        loop {
            tokio::time::sleep(interval).await;
            if let Err(e) = self.run_daily_scraping().await {
                log::error!("Scheduled daily scraping failed: {e}");
            }
        }
    }
}

/// The outbound interface consumed by the (excluded) API layer.
pub struct PricePipeline {
    orchestrator: Arc<ScrapeOrchestrator>,
    monitor: Arc<DocumentMonitor>,
    store: Arc<dyn PriceStore>,
}

impl PricePipeline {
    /// Wires the pipeline together. `check_interval_secs` is clamped to
    /// the supported polling range.
    pub fn new(
        registry: SourceRegistry,
        fetcher: Arc<dyn PageFetcher>,
        store: Arc<dyn PriceStore>,
        download_dir: impl Into<PathBuf>,
        check_interval_secs: u64,
    ) -> Self {
        let orchestrator = Arc::new(ScrapeOrchestrator::new(
            registry,
            fetcher,
            store.clone(),
            download_dir,
        ));
        let monitor = Arc::new(DocumentMonitor::new(
            orchestrator.clone(),
            store.clone(),
            check_interval_secs,
        ));
        Self {
            orchestrator,
            monitor,
            store,
        }
    }

    /// The underlying orchestrator.
    #[must_use]
    pub const fn orchestrator(&self) -> &Arc<ScrapeOrchestrator> {
        &self.orchestrator
    }

    /// The underlying monitor.
    #[must_use]
    pub const fn monitor(&self) -> &Arc<DocumentMonitor> {
        &self.monitor
    }

    /// Triggers one daily scraping run.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError`] on a store failure.
    pub async fn trigger_daily_scrape(&self) -> Result<ScrapeReport, IngestError> {
        self.orchestrator.run_daily_scraping().await
    }

    /// Triggers the one-shot historical backfill.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError`] on a store failure.
    pub async fn trigger_historical_scrape(&self) -> Result<ScrapeReport, IngestError> {
        self.orchestrator.run_historical_scraping().await
    }

    /// Runs one monitor check immediately.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError`] when the listing is unreachable or the
    /// store fails.
    pub async fn check_monitor_now(&self) -> Result<bei_map_models::CheckOutcome, MonitorError> {
        self.monitor.check_now().await
    }

    /// Monitor introspection.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store fails.
    pub async fn monitor_status(&self) -> Result<bei_map_models::MonitorStatus, StoreError> {
        self.monitor.status().await
    }

    /// The newest observations from both pipelines.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store fails.
    pub async fn latest_prices(&self) -> Result<LatestPrices, StoreError> {
        let document = self.store.latest_document().await?;
        let live = self.store.latest_live_snapshot().await?;

        Ok(LatestPrices {
            document_date: document.as_ref().map(|d| d.date),
            document_source: document.as_ref().map(|d| d.source.clone()),
            document_prices: document.map(|d| d.extracted.prices).unwrap_or_default(),
            live,
        })
    }

    /// Price observations within the last `days` days, optionally
    /// filtered by crop.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store fails.
    pub async fn price_history(
        &self,
        crop: Option<&str>,
        days: i64,
    ) -> Result<Vec<bei_map_models::HistoryEntry>, StoreError> {
        self.store.price_history(crop, days).await
    }

    /// Documents suitable for model training, filtered by quality.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store fails.
    pub async fn quality_filtered_training_data(
        &self,
        min_quality: f64,
        source: Option<&str>,
        limit: usize,
    ) -> Result<Vec<PriceDocument>, StoreError> {
        self.store
            .quality_filtered_documents(min_quality, source, limit)
            .await
    }

    /// Aggregate statistics over the latest live snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store fails.
    pub async fn live_price_summary(&self) -> Result<LivePriceSummary, StoreError> {
        let snapshot = self.store.latest_live_snapshot().await?;
        Ok(summarize_live(&snapshot))
    }

    /// Starts the background tasks (daily schedule + monitor loop) and
    /// runs for the lifetime of the process. There is no stop primitive.
    pub async fn run(&self, daily_interval: std::time::Duration) {
        let orchestrator = self.orchestrator.clone();
        tokio::spawn(async move {
            orchestrator.run_daily_schedule(daily_interval).await;
        });

        self.monitor.run().await;
    }
}

/// Builds the live-snapshot summary (crop and region breakdown, price
/// range) from a set of records.
#[must_use]
pub fn summarize_live(records: &[LivePriceRecord]) -> LivePriceSummary {
    if records.is_empty() {
        return LivePriceSummary::default();
    }

    let mut crops: Vec<String> = records.iter().map(|r| r.crop_name.clone()).collect();
    crops.sort();
    crops.dedup();

    let mut regions: Vec<String> = records
        .iter()
        .map(|r| r.region.clone())
        .filter(|r| !r.is_empty())
        .collect();
    regions.sort();
    regions.dedup();

    let min_price = records.iter().map(|r| r.price).fold(f64::INFINITY, f64::min);
    let max_price = records
        .iter()
        .map(|r| r.price)
        .fold(f64::NEG_INFINITY, f64::max);
    #[allow(clippy::cast_precision_loss)]
    let avg_price = records.iter().map(|r| r.price).sum::<f64>() / records.len() as f64;

    LivePriceSummary {
        total_crops: crops.len(),
        total_entries: records.len(),
        crops_available: crops,
        min_price,
        max_price,
        avg_price,
        regions,
    }
}
