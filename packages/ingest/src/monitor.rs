//! Continuous monitor for newly published bulletins.
//!
//! Keeps an in-memory set of already-seen document identities (rebuilt
//! from the store at startup), re-crawls the listing page on a fixed
//! interval, and feeds only the unseen delta into the same
//! fetch/extract/persist path the orchestrator uses. The seen-set is a
//! disposable cache of the store's own keys, so dropping and rebuilding
//! it is always safe.

use std::collections::HashSet;
use std::sync::Arc;

use bei_map_models::{CheckOutcome, MonitorStatus};
use bei_map_scraper::ScrapeError;
use bei_map_source::dates;
use bei_map_source::registry::clamp_poll_interval;
use bei_map_store::{InsertOutcome, PriceStore, StoreError};
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::ScrapeOrchestrator;

/// Backoff interval after a batch-level failure, in seconds.
const RETRY_INTERVAL_SECS: u64 = 300;

/// Errors that abort one monitor check cycle.
///
/// Candidate-local failures are logged inside the cycle; only these
/// batch-level failures trigger the backoff sleep.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// The listing page itself could not be fetched.
    #[error("Listing page unreachable: {0}")]
    Listing(ScrapeError),

    /// The store rejected a read or write.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Default)]
struct MonitorState {
    /// URLs and ISO dates of already-ingested documents.
    known: HashSet<String>,
    /// Completion time of the most recent check cycle.
    last_check: Option<DateTime<Utc>>,
}

/// Polls the listing page for documents that have not been ingested yet.
pub struct DocumentMonitor {
    orchestrator: Arc<ScrapeOrchestrator>,
    store: Arc<dyn PriceStore>,
    check_interval: std::time::Duration,
    state: RwLock<MonitorState>,
}

impl DocumentMonitor {
    /// Creates a monitor polling every `check_interval_secs` seconds
    /// (clamped to the supported range).
    pub fn new(
        orchestrator: Arc<ScrapeOrchestrator>,
        store: Arc<dyn PriceStore>,
        check_interval_secs: u64,
    ) -> Self {
        Self {
            orchestrator,
            store,
            check_interval: std::time::Duration::from_secs(clamp_poll_interval(
                check_interval_secs,
            )),
            state: RwLock::new(MonitorState::default()),
        }
    }

    /// Rebuilds the seen-set from the store's document identities.
    /// Returns the resulting set size.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be read.
    pub async fn load_known_documents(&self) -> Result<usize, StoreError> {
        let identities = self.store.document_identities().await?;

        let mut state = self.state.write().await;
        for identity in identities {
            state.known.insert(identity.url);
            state.known.insert(identity.date.to_string());
        }

        log::info!(
            "Loaded {} known document identitie(s) from the store",
            state.known.len()
        );
        Ok(state.known.len())
    }

    /// Runs one check cycle: crawl the listing page, filter out seen
    /// URLs, resolve dates, and ingest the delta.
    ///
    /// Dateless candidates are dropped with a warning and never enter
    /// the seen-set, so a later run with a corrected source page can
    /// still pick them up. Per-document failures are logged and do not
    /// stop the batch.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Listing`] when the listing page is
    /// unreachable (the batch-fatal case) and [`MonitorError::Store`] on
    /// store failures.
    pub async fn check_now(&self) -> Result<CheckOutcome, MonitorError> {
        log::info!("Checking for new documents...");

        let crawl = self.orchestrator.crawler().crawl_first_page().await;
        if crawl.listing_unreachable() {
            let error = crawl
                .error
                .unwrap_or_else(|| ScrapeError::Parse("listing crawl yielded no pages".to_owned()));
            return Err(MonitorError::Listing(error));
        }

        // Delta-filter against a snapshot of the seen-set, then resolve
        // dates; candidates are dropped in that order so a seen URL never
        // produces a date warning.
        let known: HashSet<String> = self.state.read().await.known.clone();
        let mut new_documents = Vec::new();

        for candidate in crawl.candidates {
            if known.contains(&candidate.url) {
                continue;
            }

            let Some(date) = dates::extract_bulletin_date(&candidate.text) else {
                log::warn!(
                    "Could not extract date from new document {:?}, dropping",
                    candidate.text
                );
                continue;
            };

            log::info!("Found NEW document: {:?} -> {}", candidate.text, candidate.url);
            new_documents.push((candidate, date));
        }

        let new_documents_found = new_documents.len();
        let mut documents_downloaded = 0;

        for (candidate, date) in new_documents {
            match self.orchestrator.process_candidate(&candidate, date).await {
                Ok(document) => {
                    let url = document.url.clone();
                    let date_key = document.date.to_string();

                    match self.store.insert_document_if_new(document).await? {
                        InsertOutcome::Inserted => {
                            documents_downloaded += 1;
                            log::info!("Successfully downloaded new document for {date_key}");
                        }
                        InsertOutcome::Duplicate => {
                            log::info!("Document for {date_key} already stored, skipping");
                        }
                    }

                    // Either way the identity is now known.
                    let mut state = self.state.write().await;
                    state.known.insert(url);
                    state.known.insert(date_key);
                }
                Err(e) => {
                    log::error!("Error downloading new document {}: {e}", candidate.url);
                }
            }
        }

        self.state.write().await.last_check = Some(Utc::now());

        if new_documents_found == 0 {
            log::info!("No new documents found");
        } else {
            log::info!(
                "Downloaded {documents_downloaded} of {new_documents_found} new document(s)"
            );
        }

        Ok(CheckOutcome {
            new_documents_found,
            documents_downloaded,
        })
    }

    /// Monitor introspection for external callers.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be read.
    pub async fn status(&self) -> Result<MonitorStatus, StoreError> {
        let (known_documents_count, last_check) = {
            let state = self.state.read().await;
            (state.known.len(), state.last_check)
        };

        Ok(MonitorStatus {
            known_documents_count,
            total_documents_in_db: self.store.count_documents().await?,
            latest_document_date: self.store.latest_document().await?.map(|d| d.date),
            check_interval_seconds: self.check_interval.as_secs(),
            last_check,
        })
    }

    /// Runs the monitor for the lifetime of the process.
    ///
    /// Sleeps `check_interval` between cycles; a batch-level failure
    /// backs off for [`RETRY_INTERVAL_SECS`] instead. There is no
    /// terminal state.
    pub async fn run(&self) {
        log::info!(
            "Starting document monitor (interval {}s)",
            self.check_interval.as_secs()
        );

        if let Err(e) = self.load_known_documents().await {
            log::error!("Error loading known documents: {e}");
        }

        loop {
            match self.check_now().await {
                Ok(_) => {
                    log::info!(
                        "Next check in {} seconds...",
                        self.check_interval.as_secs()
                    );
                    tokio::time::sleep(self.check_interval).await;
                }
                Err(e) => {
                    log::error!(
                        "Error in monitor loop: {e}; retrying in {RETRY_INTERVAL_SECS} seconds"
                    );
                    tokio::time::sleep(std::time::Duration::from_secs(RETRY_INTERVAL_SECS)).await;
                }
            }
        }
    }
}
