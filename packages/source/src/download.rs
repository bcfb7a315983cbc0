//! Document download with a local binary cache.
//!
//! Every fetched bulletin is written to the download directory before any
//! parsing happens, so the original bytes survive as a debugging and audit
//! artifact even when downstream extraction fails. Filenames are derived
//! from source and date, so re-fetching the same document overwrites the
//! same file.

use std::path::PathBuf;
use std::sync::Arc;

use bei_map_scraper::PageFetcher;

use crate::SourceError;

/// A downloaded document plus its local provenance.
#[derive(Debug)]
pub struct FetchedDocument {
    /// Raw document bytes.
    pub bytes: Vec<u8>,
    /// Where the binary was cached.
    pub file_path: PathBuf,
    /// Size in bytes.
    pub file_size: u64,
    /// Content-Type reported by the origin server.
    pub content_type: Option<String>,
}

/// Downloads documents and caches them under a fixed local directory.
pub struct DocumentFetcher {
    fetcher: Arc<dyn PageFetcher>,
    download_dir: PathBuf,
}

impl DocumentFetcher {
    /// Creates a fetcher caching into `download_dir`.
    pub fn new(fetcher: Arc<dyn PageFetcher>, download_dir: impl Into<PathBuf>) -> Self {
        Self {
            fetcher,
            download_dir: download_dir.into(),
        }
    }

    /// Downloads `url` and writes the bytes to `download_dir/filename`.
    ///
    /// Collisions silently overwrite: filenames are derived from
    /// `(source, date)`, so a collision is the same document.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Download`] on a network error or non-2xx
    /// status, [`SourceError::Io`] if the cache write fails.
    pub async fn fetch(&self, url: &str, filename: &str) -> Result<FetchedDocument, SourceError> {
        log::info!("Downloading document from {url}");
        let payload = self.fetcher.fetch_bytes(url).await?;

        std::fs::create_dir_all(&self.download_dir)?;
        let file_path = self.download_dir.join(filename);
        std::fs::write(&file_path, &payload.bytes)?;

        log::info!(
            "Saved {} byte(s) to {}",
            payload.bytes.len(),
            file_path.display()
        );

        Ok(FetchedDocument {
            file_size: payload.bytes.len() as u64,
            bytes: payload.bytes,
            file_path,
            content_type: payload.content_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use bei_map_scraper::{FetchedPayload, ScrapeError};

    use super::*;

    struct StubFetcher {
        body: Vec<u8>,
        fail: bool,
    }

    #[async_trait]
    impl PageFetcher for StubFetcher {
        async fn fetch_text(&self, _url: &str) -> Result<String, ScrapeError> {
            unimplemented!("document fetcher never fetches text")
        }

        async fn fetch_bytes(&self, url: &str) -> Result<FetchedPayload, ScrapeError> {
            if self.fail {
                return Err(ScrapeError::Parse(format!("unreachable: {url}")));
            }
            Ok(FetchedPayload {
                bytes: self.body.clone(),
                content_type: Some("application/pdf".to_owned()),
            })
        }
    }

    #[tokio::test]
    async fn writes_bytes_to_download_dir() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = DocumentFetcher::new(
            Arc::new(StubFetcher {
                body: b"%PDF-1.4 fake".to_vec(),
                fail: false,
            }),
            dir.path(),
        );

        let doc = fetcher
            .fetch("https://ministry.example/doc.pdf", "tanzania_2025-08-06.pdf")
            .await
            .unwrap();

        assert_eq!(doc.file_size, 13);
        assert_eq!(doc.content_type.as_deref(), Some("application/pdf"));
        assert_eq!(std::fs::read(&doc.file_path).unwrap(), b"%PDF-1.4 fake");
    }

    #[tokio::test]
    async fn collisions_overwrite() {
        let dir = tempfile::tempdir().unwrap();

        for body in [b"first".to_vec(), b"second".to_vec()] {
            let fetcher = DocumentFetcher::new(
                Arc::new(StubFetcher { body, fail: false }),
                dir.path(),
            );
            fetcher
                .fetch("https://ministry.example/doc.pdf", "tanzania_2025-08-06.pdf")
                .await
                .unwrap();
        }

        let cached = std::fs::read(dir.path().join("tanzania_2025-08-06.pdf")).unwrap();
        assert_eq!(cached, b"second");
    }

    #[tokio::test]
    async fn download_errors_propagate() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = DocumentFetcher::new(
            Arc::new(StubFetcher {
                body: Vec::new(),
                fail: true,
            }),
            dir.path(),
        );

        let result = fetcher
            .fetch("https://ministry.example/doc.pdf", "x.pdf")
            .await;

        assert!(matches!(result, Err(SourceError::Download(_))));
    }
}
