#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Persistence boundary for the price pipeline.
//!
//! The pipeline treats storage as an abstract document collection behind
//! the [`PriceStore`] trait: idempotent insert-by-natural-key for PDF
//! documents, append-only writes for live records, and the count/find/
//! distinct/aggregate queries the scorer and API layer need. Any
//! document-oriented store can implement the trait; [`MemoryPriceStore`]
//! is the in-process reference implementation used by the CLI and tests.

pub mod memory;

pub use memory::MemoryPriceStore;

use async_trait::async_trait;
use bei_map_models::{
    DocumentIdentity, HistoryEntry, LivePriceRecord, PriceDocument, SourceQualitySummary,
};
use chrono::NaiveDate;

/// Errors surfaced by a store implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing store failed (connection lost, lock poisoned, ...).
    #[error("Store backend error: {0}")]
    Backend(String),
}

/// Result of an insert-if-new operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The document was persisted.
    Inserted,
    /// A document with the same `(date, source)` already existed; the
    /// candidate was dropped. An expected outcome, not an error.
    Duplicate,
}

/// Abstract document collection holding both price pipelines' output.
///
/// Implementations must make [`insert_document_if_new`] atomic with
/// respect to the `(date, source)` natural key: two concurrent writers
/// for the same key cannot both observe [`InsertOutcome::Inserted`].
///
/// [`insert_document_if_new`]: PriceStore::insert_document_if_new
#[async_trait]
pub trait PriceStore: Send + Sync {
    /// Persists a document unless its `(date, source)` already exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend fails. A duplicate key is
    /// [`InsertOutcome::Duplicate`], never an error.
    async fn insert_document_if_new(
        &self,
        document: PriceDocument,
    ) -> Result<InsertOutcome, StoreError>;

    /// Appends live market records (point-in-time snapshots, never
    /// deduplicated). Returns the number appended.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend fails.
    async fn append_live_records(
        &self,
        records: Vec<LivePriceRecord>,
    ) -> Result<u64, StoreError>;

    /// Finds a document by its `(date, source)` natural key.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend fails.
    async fn find_document(
        &self,
        date: NaiveDate,
        source: &str,
    ) -> Result<Option<PriceDocument>, StoreError>;

    /// Finds a document by its canonical URL.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend fails.
    async fn find_document_by_url(
        &self,
        url: &str,
    ) -> Result<Option<PriceDocument>, StoreError>;

    /// Total number of stored PDF documents.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend fails.
    async fn count_documents(&self) -> Result<u64, StoreError>;

    /// The `(url, date)` identities of every stored document, for
    /// rebuilding the monitor's seen-set at startup.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend fails.
    async fn document_identities(&self) -> Result<Vec<DocumentIdentity>, StoreError>;

    /// The stored document with the most recent bulletin date.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend fails.
    async fn latest_document(&self) -> Result<Option<PriceDocument>, StoreError>;

    /// All live records sharing the most recent scrape timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend fails.
    async fn latest_live_snapshot(&self) -> Result<Vec<LivePriceRecord>, StoreError>;

    /// Price observations from both pipelines within the last `days`
    /// days, optionally filtered by crop, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend fails.
    async fn price_history(
        &self,
        crop: Option<&str>,
        days: i64,
    ) -> Result<Vec<HistoryEntry>, StoreError>;

    /// Documents with `quality_score >= min_quality`, optionally filtered
    /// by source, best quality first, at most `limit`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend fails.
    async fn quality_filtered_documents(
        &self,
        min_quality: f64,
        source: Option<&str>,
        limit: usize,
    ) -> Result<Vec<PriceDocument>, StoreError>;

    /// Distinct source identifiers across both pipelines, sorted.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend fails.
    async fn distinct_sources(&self) -> Result<Vec<String>, StoreError>;

    /// Per-source document count and mean quality score.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend fails.
    async fn quality_summary(&self) -> Result<Vec<SourceQualitySummary>, StoreError>;
}
