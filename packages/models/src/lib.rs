#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shared data model for the price ingestion pipeline.
//!
//! Two kinds of price observation flow through the system:
//!
//! - [`PriceDocument`]: one per PDF bulletin ingested from the ministry
//!   listing, deduplicated on the `(date, source)` natural key.
//! - [`LivePriceRecord`]: one per marketplace table row, append-only
//!   point-in-time snapshots with no deduplication.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Classification tag carried by every live price record.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DataType {
    /// Scraped directly from a marketplace HTML page.
    RealTimePrice,
    /// Extracted from a published PDF bulletin.
    DocumentPrice,
}

/// An anchor discovered on the listing page that heuristically looks like
/// a price bulletin, prior to date resolution or download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateDocument {
    /// Visible link text (often Swahili, e.g. "Bei ya Mazao th.06 Agosti ,2025").
    pub text: String,
    /// Absolute URL of the document.
    pub url: String,
    /// 1-indexed listing page the anchor was found on.
    pub page_found: u32,
}

/// Document properties exposed by the PDF container, when present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    /// Document title from the PDF Info dictionary.
    pub title: Option<String>,
    /// Document author from the PDF Info dictionary.
    pub author: Option<String>,
    /// Document subject from the PDF Info dictionary.
    pub subject: Option<String>,
    /// Producing application, if recorded.
    pub producer: Option<String>,
}

impl DocumentMetadata {
    /// Returns `true` when no metadata field is populated.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.subject.is_none()
            && self.producer.is_none()
    }
}

/// Structured content extracted from one PDF bulletin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedContent {
    /// Full plain text, all pages concatenated.
    pub text_content: String,
    /// Extracted tables: table → rows → cell strings.
    pub tables: Vec<Vec<Vec<String>>>,
    /// Crop key → normalized price string (e.g. `"maize" → "TSh 1,200"`).
    pub prices: BTreeMap<String, String>,
    /// Document properties, when the PDF container exposes them.
    pub metadata: DocumentMetadata,
    /// Page count.
    pub pages: usize,
}

/// A persisted PDF-derived price bulletin.
///
/// Created exactly once at successful ingestion and never mutated; a later
/// candidate with the same `(date, source)` is dropped, not merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceDocument {
    /// Nominal bulletin date, extracted from the listing link text.
    pub date: NaiveDate,
    /// Origin identifier (e.g. "Tanzania Ministry of Industry and Trade").
    /// Together with `date` this forms the natural key.
    pub source: String,
    /// Canonical absolute URL of the origin document; secondary dedup key
    /// for the monitor.
    pub url: String,
    /// Structured content pulled out of the PDF.
    pub extracted: ExtractedContent,
    /// Heuristic [0, 1] measure of how much usable content was extracted.
    /// Computed once at ingestion, never recomputed in place.
    pub quality_score: f64,
    /// Local path of the cached binary.
    pub file_path: String,
    /// Size of the downloaded binary in bytes.
    pub file_size: u64,
    /// Content-Type reported by the origin server.
    pub content_type: Option<String>,
    /// 1-indexed listing page the document was discovered on.
    pub page_found: u32,
    /// Ingestion timestamp (distinct from `date`, the bulletin's nominal date).
    pub scraped_at: DateTime<Utc>,
}

/// A price observation scraped directly from the marketplace HTML table.
///
/// Append-only: each poll writes the current snapshot, nothing is updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LivePriceRecord {
    /// Crop name as displayed on the marketplace.
    pub crop_name: String,
    /// Offered quantity text (e.g. "100 kg").
    pub quantity: String,
    /// Quality grade text.
    pub quality: String,
    /// Numeric price.
    pub price: f64,
    /// Currency tag, fixed to `"TSh"`.
    pub currency: String,
    /// Region the offer was posted from.
    pub region: String,
    /// Origin identifier, fixed to `"cropsupply.com"`.
    pub source: String,
    /// Scrape timestamp.
    pub scraped_at: DateTime<Utc>,
    /// Classification tag ([`DataType::RealTimePrice`]).
    pub data_type: DataType,
}

/// The `(url, date)` identity of a stored document, used to rebuild the
/// monitor's seen-set at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentIdentity {
    /// Canonical document URL.
    pub url: String,
    /// Bulletin date.
    pub date: NaiveDate,
}

/// Monitor introspection snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorStatus {
    /// Number of identities in the in-memory seen-set.
    pub known_documents_count: usize,
    /// Total PDF documents persisted in the store.
    pub total_documents_in_db: u64,
    /// Most recent bulletin date in the store.
    pub latest_document_date: Option<NaiveDate>,
    /// Configured poll interval in seconds.
    pub check_interval_seconds: u64,
    /// Completion time of the most recent check cycle.
    pub last_check: Option<DateTime<Utc>>,
}

/// Result of one explicit or scheduled monitor check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckOutcome {
    /// Unseen candidates discovered on the listing page.
    pub new_documents_found: usize,
    /// Candidates successfully fetched, extracted, and persisted.
    pub documents_downloaded: usize,
}

/// Summary of one orchestrator run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeReport {
    /// Candidate documents with a resolvable date that were processed.
    pub documents_found: usize,
    /// Documents newly persisted this run.
    pub documents_inserted: usize,
    /// Documents skipped because their `(date, source)` already existed.
    pub documents_skipped: usize,
    /// Live market records appended this run.
    pub live_records: usize,
}

/// One point in a price history query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Observation date.
    pub date: NaiveDate,
    /// Origin identifier.
    pub source: String,
    /// Crop key or marketplace crop name.
    pub crop: String,
    /// Price as recorded (normalized string for bulletin prices,
    /// formatted numeric for live records).
    pub price: String,
}

/// The most recent observations from both pipelines.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestPrices {
    /// Bulletin date of the newest stored document.
    pub document_date: Option<NaiveDate>,
    /// Source of the newest stored document.
    pub document_source: Option<String>,
    /// Crop → price map from the newest stored document.
    pub document_prices: BTreeMap<String, String>,
    /// The newest live snapshot (all records sharing the latest scrape time).
    pub live: Vec<LivePriceRecord>,
}

/// Aggregate statistics over the latest live snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LivePriceSummary {
    /// Distinct crops present.
    pub total_crops: usize,
    /// Total records in the snapshot.
    pub total_entries: usize,
    /// Crop names, sorted.
    pub crops_available: Vec<String>,
    /// Lowest price in the snapshot.
    pub min_price: f64,
    /// Highest price in the snapshot.
    pub max_price: f64,
    /// Mean price across the snapshot.
    pub avg_price: f64,
    /// Distinct regions present, sorted.
    pub regions: Vec<String>,
}

/// Per-source quality aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceQualitySummary {
    /// Origin identifier.
    pub source: String,
    /// Documents stored for this source.
    pub documents: u64,
    /// Mean quality score across those documents.
    pub avg_quality: f64,
}
