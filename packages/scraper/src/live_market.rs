//! Live price extraction from the marketplace HTML page.
//!
//! The marketplace renders current offers as a plain `<table>` with a fixed
//! column layout (id, image, crop, quantity, quality, price, region). Rows
//! are extracted by column index; a malformed row is logged and skipped so
//! one bad listing never aborts the page.

use std::sync::Arc;

use bei_map_models::{DataType, LivePriceRecord};
use scraper::{Html, Selector};
use serde::Deserialize;

use crate::{PageFetcher, ScrapeError};

/// Configuration for the marketplace price table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LiveMarketConfig {
    /// URL of the page carrying the price table.
    pub url: String,
    /// Source tag stamped on every record (e.g. `"cropsupply.com"`).
    pub source: String,
    /// Currency tag stamped on every record.
    pub currency: String,
    /// Minimum cell count for a row to be considered a data row.
    pub min_columns: usize,
    /// Zero-based index of the crop-name cell.
    pub crop_column: usize,
    /// Zero-based index of the quantity cell.
    pub quantity_column: usize,
    /// Zero-based index of the quality cell.
    pub quality_column: usize,
    /// Zero-based index of the price cell.
    pub price_column: usize,
    /// Zero-based index of the region cell.
    pub region_column: usize,
}

/// Scrapes the marketplace page and extracts the price listing.
pub struct LiveMarketScraper {
    fetcher: Arc<dyn PageFetcher>,
    config: LiveMarketConfig,
}

impl LiveMarketScraper {
    /// Creates a scraper for the configured marketplace page.
    #[must_use]
    pub fn new(fetcher: Arc<dyn PageFetcher>, config: LiveMarketConfig) -> Self {
        Self { fetcher, config }
    }

    /// Fetches the marketplace page and extracts all price records.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError`] if the page itself cannot be fetched.
    /// Malformed rows degrade to skips, never errors.
    pub async fn scrape(&self) -> Result<Vec<LivePriceRecord>, ScrapeError> {
        log::info!("Scraping live market prices from {}", self.config.url);
        let html = self.fetcher.fetch_text(&self.config.url).await?;
        let records = parse_price_table(&html, &self.config);
        log::info!("Extracted {} live price record(s)", records.len());
        Ok(records)
    }
}

/// Extracts price records from every `<table>` in the page.
///
/// The first row of each table is treated as the header and skipped. Rows
/// with fewer than `min_columns` cells, an empty crop name, or a price cell
/// that does not reduce to a number are skipped.
#[must_use]
pub fn parse_price_table(html: &str, config: &LiveMarketConfig) -> Vec<LivePriceRecord> {
    let document = Html::parse_document(html);
    let table_sel = Selector::parse("table").unwrap_or_else(|_| unreachable!());
    let row_sel = Selector::parse("tr").unwrap_or_else(|_| unreachable!());
    let cell_sel = Selector::parse("td").unwrap_or_else(|_| unreachable!());

    let scraped_at = chrono::Utc::now();
    let mut records = Vec::new();

    for table in document.select(&table_sel) {
        for (row_idx, row) in table.select(&row_sel).enumerate().skip(1) {
            let cells: Vec<String> = row
                .select(&cell_sel)
                .map(|cell| cell.text().collect::<String>().trim().to_owned())
                .collect();

            if cells.len() < config.min_columns {
                log::debug!(
                    "Skipping row {row_idx}: {} cell(s), need {}",
                    cells.len(),
                    config.min_columns
                );
                continue;
            }

            let crop_name = cells[config.crop_column].clone();
            let price_text = &cells[config.price_column];

            if crop_name.is_empty() || price_text.is_empty() {
                continue;
            }

            let Some(price) = extract_numeric_price(price_text) else {
                log::warn!("Skipping row {row_idx}: unparsable price {price_text:?}");
                continue;
            };

            records.push(LivePriceRecord {
                crop_name,
                quantity: cells[config.quantity_column].clone(),
                quality: cells[config.quality_column].clone(),
                price,
                currency: config.currency.clone(),
                region: cells[config.region_column].clone(),
                source: config.source.clone(),
                scraped_at,
                data_type: DataType::RealTimePrice,
            });
        }
    }

    records
}

/// Reduces a price cell to a number by stripping every character other
/// than digits and the decimal point (`"TSh 1,200.50"` → `1200.50`).
#[must_use]
pub fn extract_numeric_price(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> LiveMarketConfig {
        LiveMarketConfig {
            url: "https://market.example/".to_owned(),
            source: "cropsupply.com".to_owned(),
            currency: "TSh".to_owned(),
            min_columns: 7,
            crop_column: 2,
            quantity_column: 3,
            quality_column: 4,
            price_column: 5,
            region_column: 6,
        }
    }

    fn row(id: &str, crop: &str, qty: &str, quality: &str, price: &str, region: &str) -> String {
        format!(
            "<tr><td>{id}</td><td><img src=\"x.jpg\"></td><td>{crop}</td>\
             <td>{qty}</td><td>{quality}</td><td>{price}</td><td>{region}</td></tr>"
        )
    }

    fn table(rows: &[String]) -> String {
        format!(
            "<html><body><table>\
             <tr><th>ID</th><th>Image</th><th>Crop</th><th>Quantity</th>\
             <th>Quality</th><th>Price</th><th>Region</th></tr>{}</table></body></html>",
            rows.concat()
        )
    }

    #[test]
    fn skips_row_with_non_numeric_price() {
        let html = table(&[
            row("1", "Maize", "100 kg", "Grade A", "TSh 1,200", "Arusha"),
            row("2", "Rice", "50 kg", "Grade B", "TSh 2,500", "Mbeya"),
            row("3", "Beans", "25 kg", "Grade A", "Call for price", "Dodoma"),
            row("4", "Cassava", "80 kg", "Grade C", "900", "Mwanza"),
            row("5", "Onions", "40 kg", "Grade A", "TSh 1,750.50", "Iringa"),
        ]);

        let records = parse_price_table(&html, &config());

        assert_eq!(records.len(), 4);
        assert_eq!(records[0].crop_name, "Maize");
        assert!((records[0].price - 1200.0).abs() < f64::EPSILON);
        assert_eq!(records[0].currency, "TSh");
        assert_eq!(records[0].region, "Arusha");
        assert!((records[3].price - 1750.50).abs() < f64::EPSILON);
        assert!(records.iter().all(|r| r.crop_name != "Beans"));
    }

    #[test]
    fn skips_rows_with_too_few_columns() {
        let html = table(&[
            "<tr><td>1</td><td>Maize</td><td>1200</td></tr>".to_owned(),
            row("2", "Rice", "50 kg", "Grade B", "2500", "Mbeya"),
        ]);

        let records = parse_price_table(&html, &config());

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].crop_name, "Rice");
    }

    #[test]
    fn header_row_is_not_a_record() {
        let html = table(&[]);
        assert!(parse_price_table(&html, &config()).is_empty());
    }

    #[test]
    fn numeric_price_extraction() {
        assert_eq!(extract_numeric_price("TSh 1,200"), Some(1200.0));
        assert_eq!(extract_numeric_price("2500"), Some(2500.0));
        assert_eq!(extract_numeric_price("$1,234.56"), Some(1234.56));
        assert_eq!(extract_numeric_price("negotiable"), None);
        assert_eq!(extract_numeric_price(""), None);
    }
}
