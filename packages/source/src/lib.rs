#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Price-domain logic for the ingestion pipeline.
//!
//! Everything that understands what a price bulletin *means* lives here:
//! the Swahili bulletin-date heuristic ([`dates`]), crop price-field
//! extraction ([`prices`]), the ingestion quality scorer ([`quality`]),
//! the document fetcher that caches binaries locally ([`download`]), and
//! the embedded TOML source registry ([`registry`]).

pub mod dates;
pub mod download;
pub mod prices;
pub mod quality;
pub mod registry;

/// Errors that can occur during source-level operations.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Downloading a document failed (network error or non-2xx status).
    #[error("Download failed: {0}")]
    Download(#[from] bei_map_scraper::ScrapeError),

    /// Writing the cached binary to disk failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
