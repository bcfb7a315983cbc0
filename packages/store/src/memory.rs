//! In-memory reference implementation of [`PriceStore`].
//!
//! Holds everything in two vectors behind one [`RwLock`]. The natural-key
//! check and the insert happen under a single write lock, which gives
//! [`PriceStore::insert_document_if_new`] the atomicity the trait
//! requires without a unique index.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::RwLock;

use async_trait::async_trait;
use bei_map_models::{
    DocumentIdentity, HistoryEntry, LivePriceRecord, PriceDocument, SourceQualitySummary,
};
use chrono::NaiveDate;

use crate::{InsertOutcome, PriceStore, StoreError};

#[derive(Debug, Default)]
struct Inner {
    documents: Vec<PriceDocument>,
    live: Vec<LivePriceRecord>,
}

/// In-memory [`PriceStore`].
#[derive(Debug, Default)]
pub struct MemoryPriceStore {
    inner: RwLock<Inner>,
}

impl MemoryPriceStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Inner>, StoreError> {
        self.inner
            .read()
            .map_err(|_| StoreError::Backend("store lock poisoned".to_owned()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Inner>, StoreError> {
        self.inner
            .write()
            .map_err(|_| StoreError::Backend("store lock poisoned".to_owned()))
    }
}

#[async_trait]
impl PriceStore for MemoryPriceStore {
    async fn insert_document_if_new(
        &self,
        document: PriceDocument,
    ) -> Result<InsertOutcome, StoreError> {
        let mut inner = self.write()?;

        let exists = inner
            .documents
            .iter()
            .any(|d| d.date == document.date && d.source == document.source);
        if exists {
            return Ok(InsertOutcome::Duplicate);
        }

        inner.documents.push(document);
        Ok(InsertOutcome::Inserted)
    }

    async fn append_live_records(
        &self,
        records: Vec<LivePriceRecord>,
    ) -> Result<u64, StoreError> {
        let mut inner = self.write()?;
        let count = records.len() as u64;
        inner.live.extend(records);
        Ok(count)
    }

    async fn find_document(
        &self,
        date: NaiveDate,
        source: &str,
    ) -> Result<Option<PriceDocument>, StoreError> {
        let inner = self.read()?;
        Ok(inner
            .documents
            .iter()
            .find(|d| d.date == date && d.source == source)
            .cloned())
    }

    async fn find_document_by_url(
        &self,
        url: &str,
    ) -> Result<Option<PriceDocument>, StoreError> {
        let inner = self.read()?;
        Ok(inner.documents.iter().find(|d| d.url == url).cloned())
    }

    async fn count_documents(&self) -> Result<u64, StoreError> {
        Ok(self.read()?.documents.len() as u64)
    }

    async fn document_identities(&self) -> Result<Vec<DocumentIdentity>, StoreError> {
        let inner = self.read()?;
        Ok(inner
            .documents
            .iter()
            .map(|d| DocumentIdentity {
                url: d.url.clone(),
                date: d.date,
            })
            .collect())
    }

    async fn latest_document(&self) -> Result<Option<PriceDocument>, StoreError> {
        let inner = self.read()?;
        Ok(inner
            .documents
            .iter()
            .max_by_key(|d| d.date)
            .cloned())
    }

    async fn latest_live_snapshot(&self) -> Result<Vec<LivePriceRecord>, StoreError> {
        let inner = self.read()?;
        let Some(latest) = inner.live.iter().map(|r| r.scraped_at).max() else {
            return Ok(Vec::new());
        };
        Ok(inner
            .live
            .iter()
            .filter(|r| r.scraped_at == latest)
            .cloned()
            .collect())
    }

    async fn price_history(
        &self,
        crop: Option<&str>,
        days: i64,
    ) -> Result<Vec<HistoryEntry>, StoreError> {
        let inner = self.read()?;
        let cutoff = chrono::Utc::now() - chrono::Duration::days(days);
        let cutoff_date = cutoff.date_naive();
        let crop_filter = crop.map(str::to_lowercase);

        let mut entries: Vec<HistoryEntry> = Vec::new();

        for document in inner.documents.iter().filter(|d| d.date >= cutoff_date) {
            for (key, price) in &document.extracted.prices {
                if crop_filter
                    .as_deref()
                    .is_none_or(|filter| key.to_lowercase().contains(filter))
                {
                    entries.push(HistoryEntry {
                        date: document.date,
                        source: document.source.clone(),
                        crop: key.clone(),
                        price: price.clone(),
                    });
                }
            }
        }

        for record in inner.live.iter().filter(|r| r.scraped_at >= cutoff) {
            if crop_filter
                .as_deref()
                .is_none_or(|filter| record.crop_name.to_lowercase().contains(filter))
            {
                entries.push(HistoryEntry {
                    date: record.scraped_at.date_naive(),
                    source: record.source.clone(),
                    crop: record.crop_name.clone(),
                    price: format!("{} {}", record.currency, record.price),
                });
            }
        }

        entries.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(entries)
    }

    async fn quality_filtered_documents(
        &self,
        min_quality: f64,
        source: Option<&str>,
        limit: usize,
    ) -> Result<Vec<PriceDocument>, StoreError> {
        let inner = self.read()?;
        let mut matches: Vec<PriceDocument> = inner
            .documents
            .iter()
            .filter(|d| d.quality_score >= min_quality)
            .filter(|d| source.is_none_or(|s| d.source == s))
            .cloned()
            .collect();

        matches.sort_by(|a, b| {
            b.quality_score
                .partial_cmp(&a.quality_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.date.cmp(&a.date))
        });
        matches.truncate(limit);
        Ok(matches)
    }

    async fn distinct_sources(&self) -> Result<Vec<String>, StoreError> {
        let inner = self.read()?;
        let sources: BTreeSet<String> = inner
            .documents
            .iter()
            .map(|d| d.source.clone())
            .chain(inner.live.iter().map(|r| r.source.clone()))
            .collect();
        Ok(sources.into_iter().collect())
    }

    async fn quality_summary(&self) -> Result<Vec<SourceQualitySummary>, StoreError> {
        let inner = self.read()?;
        let mut grouped: BTreeMap<&str, (u64, f64)> = BTreeMap::new();

        for document in &inner.documents {
            let entry = grouped.entry(document.source.as_str()).or_insert((0, 0.0));
            entry.0 += 1;
            entry.1 += document.quality_score;
        }

        Ok(grouped
            .into_iter()
            .map(|(source, (documents, total))| {
                #[allow(clippy::cast_precision_loss)]
                let avg_quality = total / documents as f64;
                SourceQualitySummary {
                    source: source.to_owned(),
                    documents,
                    avg_quality,
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use bei_map_models::{DataType, ExtractedContent};
    use chrono::Utc;

    use super::*;

    fn document(date: &str, source: &str, url: &str, quality: f64) -> PriceDocument {
        PriceDocument {
            date: date.parse().unwrap(),
            source: source.to_owned(),
            url: url.to_owned(),
            extracted: ExtractedContent {
                prices: [("maize".to_owned(), "TSh 85,000".to_owned())]
                    .into_iter()
                    .collect(),
                ..ExtractedContent::default()
            },
            quality_score: quality,
            file_path: format!("downloads/pdfs/tanzania_{date}.pdf"),
            file_size: 1024,
            content_type: Some("application/pdf".to_owned()),
            page_found: 1,
            scraped_at: Utc::now(),
        }
    }

    fn live_record(crop: &str, price: f64) -> LivePriceRecord {
        LivePriceRecord {
            crop_name: crop.to_owned(),
            quantity: "100 kg".to_owned(),
            quality: "Grade A".to_owned(),
            price,
            currency: "TSh".to_owned(),
            region: "Arusha".to_owned(),
            source: "cropsupply.com".to_owned(),
            scraped_at: Utc::now(),
            data_type: DataType::RealTimePrice,
        }
    }

    #[tokio::test]
    async fn natural_key_dedup_keeps_first_document() {
        let store = MemoryPriceStore::new();

        let first = store
            .insert_document_if_new(document("2025-08-06", "ministry", "https://x.tz/a.pdf", 0.9))
            .await
            .unwrap();
        let second = store
            .insert_document_if_new(document("2025-08-06", "ministry", "https://x.tz/b.pdf", 0.1))
            .await
            .unwrap();

        assert_eq!(first, InsertOutcome::Inserted);
        assert_eq!(second, InsertOutcome::Duplicate);
        assert_eq!(store.count_documents().await.unwrap(), 1);

        let stored = store
            .find_document("2025-08-06".parse().unwrap(), "ministry")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.url, "https://x.tz/a.pdf");
    }

    #[tokio::test]
    async fn same_date_different_source_both_persist() {
        let store = MemoryPriceStore::new();
        store
            .insert_document_if_new(document("2025-08-06", "ministry", "https://x.tz/a.pdf", 0.9))
            .await
            .unwrap();
        store
            .insert_document_if_new(document("2025-08-06", "other", "https://y.tz/a.pdf", 0.9))
            .await
            .unwrap();

        assert_eq!(store.count_documents().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn live_records_always_append() {
        let store = MemoryPriceStore::new();
        for _ in 0..2 {
            store
                .append_live_records(vec![live_record("Maize", 1200.0)])
                .await
                .unwrap();
        }

        let snapshot = store.latest_live_snapshot().await.unwrap();
        assert_eq!(snapshot.len(), 1); // only the newest scrape instant
        let history = store.price_history(None, 7).await.unwrap();
        assert_eq!(history.len(), 2);
    }

    #[tokio::test]
    async fn quality_filter_orders_and_limits() {
        let store = MemoryPriceStore::new();
        store
            .insert_document_if_new(document("2025-08-04", "ministry", "https://x.tz/a.pdf", 0.3))
            .await
            .unwrap();
        store
            .insert_document_if_new(document("2025-08-05", "ministry", "https://x.tz/b.pdf", 0.9))
            .await
            .unwrap();
        store
            .insert_document_if_new(document("2025-08-06", "ministry", "https://x.tz/c.pdf", 0.6))
            .await
            .unwrap();

        let filtered = store
            .quality_filtered_documents(0.5, Some("ministry"), 10)
            .await
            .unwrap();
        assert_eq!(filtered.len(), 2);
        assert!((filtered[0].quality_score - 0.9).abs() < f64::EPSILON);

        let limited = store.quality_filtered_documents(0.0, None, 1).await.unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn history_filters_by_crop() {
        let store = MemoryPriceStore::new();
        store
            .insert_document_if_new(document(
                &Utc::now().date_naive().to_string(),
                "ministry",
                "https://x.tz/a.pdf",
                0.9,
            ))
            .await
            .unwrap();
        store
            .append_live_records(vec![live_record("Rice", 2500.0)])
            .await
            .unwrap();

        let maize = store.price_history(Some("maize"), 7).await.unwrap();
        assert_eq!(maize.len(), 1);
        assert_eq!(maize[0].crop, "maize");

        let all = store.price_history(None, 7).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn aggregates_quality_by_source() {
        let store = MemoryPriceStore::new();
        store
            .insert_document_if_new(document("2025-08-05", "ministry", "https://x.tz/a.pdf", 0.4))
            .await
            .unwrap();
        store
            .insert_document_if_new(document("2025-08-06", "ministry", "https://x.tz/b.pdf", 0.8))
            .await
            .unwrap();

        let summary = store.quality_summary().await.unwrap();
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].documents, 2);
        assert!((summary[0].avg_quality - 0.6).abs() < 1e-9);

        let sources = store.distinct_sources().await.unwrap();
        assert_eq!(sources, vec!["ministry".to_owned()]);

        let latest = store.latest_document().await.unwrap().unwrap();
        assert_eq!(latest.url, "https://x.tz/b.pdf");
    }
}
