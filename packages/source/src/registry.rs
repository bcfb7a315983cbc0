//! Source registry — loads all source definitions from embedded TOML
//! configs.
//!
//! The TOML files under `packages/source/sources/` are baked into the
//! binary at compile time via [`include_str!`]. Anchor keyword tables,
//! the crop lexicon, URLs, and pagination limits are all configuration
//! data here rather than literals scattered through control flow, so the
//! tables can be exercised directly by tests.

use bei_map_scraper::live_market::LiveMarketConfig;
use bei_map_scraper::site_listing::ListingConfig;
use serde::Deserialize;

use crate::prices::CropLexicon;

/// TOML configs embedded at compile time.
const TANZANIA_TOML: &str = include_str!("../sources/tanzania.toml");
const CROPSUPPLY_TOML: &str = include_str!("../sources/cropsupply.toml");
const CROPS_TOML: &str = include_str!("../sources/crops.toml");

/// Lower bound for the monitor poll interval.
pub const MIN_POLL_INTERVAL_SECS: u64 = 300;

/// Upper bound for the monitor poll interval.
pub const MAX_POLL_INTERVAL_SECS: u64 = 86_400;

/// The PDF bulletin source definition.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BulletinSource {
    /// Registry identifier.
    pub id: String,
    /// Origin identifier stored on every document
    /// (e.g. "Tanzania Ministry of Industry and Trade").
    pub name: String,
    /// Prefix for cached binary filenames (`{prefix}_{date}.pdf`).
    pub filename_prefix: String,
    /// Listing crawl configuration.
    pub listing: ListingConfig,
}

impl BulletinSource {
    /// Deterministic cache filename for a bulletin date.
    #[must_use]
    pub fn filename_for(&self, date: chrono::NaiveDate) -> String {
        format!("{}_{date}.pdf", self.filename_prefix)
    }
}

/// The live marketplace source definition.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LiveMarketSource {
    /// Registry identifier.
    pub id: String,
    /// Marketplace table configuration.
    pub market: LiveMarketConfig,
}

/// All configured sources plus the crop lexicon.
#[derive(Debug, Clone)]
pub struct SourceRegistry {
    /// The PDF bulletin source.
    pub bulletin: BulletinSource,
    /// The live marketplace source.
    pub live_market: LiveMarketSource,
    /// Crop synonym lexicon used for price-field extraction.
    pub crops: CropLexicon,
}

/// Parses the embedded registry.
///
/// # Panics
///
/// Panics if any embedded TOML config is malformed (a compile-time
/// guarantee in practice, since the configs are baked into the binary).
#[must_use]
pub fn load() -> SourceRegistry {
    SourceRegistry {
        bulletin: toml::from_str(TANZANIA_TOML)
            .unwrap_or_else(|e| panic!("Failed to parse tanzania.toml: {e}")),
        live_market: toml::from_str(CROPSUPPLY_TOML)
            .unwrap_or_else(|e| panic!("Failed to parse cropsupply.toml: {e}")),
        crops: toml::from_str(CROPS_TOML)
            .unwrap_or_else(|e| panic!("Failed to parse crops.toml: {e}")),
    }
}

/// Clamps a poll interval to the supported range.
#[must_use]
pub const fn clamp_poll_interval(secs: u64) -> u64 {
    if secs < MIN_POLL_INTERVAL_SECS {
        MIN_POLL_INTERVAL_SECS
    } else if secs > MAX_POLL_INTERVAL_SECS {
        MAX_POLL_INTERVAL_SECS
    } else {
        secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Crops the lexicon must cover (used in tests).
    const EXPECTED_CROP_COUNT: usize = 14;

    #[test]
    fn loads_registry() {
        let registry = load();
        assert_eq!(registry.bulletin.id, "tanzania_ministry");
        assert_eq!(registry.live_market.id, "cropsupply");
        assert_eq!(registry.crops.crops.len(), EXPECTED_CROP_COUNT);
    }

    #[test]
    fn crop_keys_are_unique_and_synonyms_lowercase() {
        let registry = load();
        let mut keys: Vec<&str> = registry
            .crops
            .crops
            .iter()
            .map(|c| c.key.as_str())
            .collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), EXPECTED_CROP_COUNT);

        for crop in &registry.crops.crops {
            assert!(!crop.synonyms.is_empty(), "{}: no synonyms", crop.key);
            for synonym in &crop.synonyms {
                assert_eq!(
                    synonym,
                    &synonym.to_lowercase(),
                    "{}: synonym {synonym:?} not lowercase",
                    crop.key
                );
            }
        }
    }

    #[test]
    fn listing_config_has_required_tables() {
        let registry = load();
        let listing = &registry.bulletin.listing;
        assert!(!listing.bulletin_markers.is_empty());
        assert!(!listing.keywords.is_empty());
        assert!(!listing.pdf_keywords.is_empty());
        assert!(listing.max_pages >= 1);
        assert!(listing.listing_url.starts_with(&listing.origin));
    }

    #[test]
    fn market_columns_fit_the_minimum_width() {
        let registry = load();
        let market = &registry.live_market.market;
        for column in [
            market.crop_column,
            market.quantity_column,
            market.quality_column,
            market.price_column,
            market.region_column,
        ] {
            assert!(column < market.min_columns);
        }
    }

    #[test]
    fn bulletin_filenames_are_deterministic() {
        let registry = load();
        let date = chrono::NaiveDate::from_ymd_opt(2025, 8, 6).unwrap();
        assert_eq!(
            registry.bulletin.filename_for(date),
            "tanzania_2025-08-06.pdf"
        );
    }

    #[test]
    fn poll_interval_is_clamped_to_supported_range() {
        assert_eq!(clamp_poll_interval(10), MIN_POLL_INTERVAL_SECS);
        assert_eq!(clamp_poll_interval(3600), 3600);
        assert_eq!(clamp_poll_interval(1_000_000), MAX_POLL_INTERVAL_SECS);
    }
}
