//! Crop price-field extraction from bulletin text.
//!
//! A fixed lexicon maps canonical crop keys to keyword synonyms in
//! English and Swahili. The text is scanned line by line: the first crop
//! whose synonym appears on a line claims that line, and a crop that
//! already has a recorded price is never overwritten: first match wins
//! per crop, not per line.

use std::collections::BTreeMap;

use regex::Regex;
use serde::Deserialize;

/// One canonical crop and its matching synonyms.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CropEntry {
    /// Canonical crop key (e.g. `"maize"`).
    pub key: String,
    /// Lowercase keyword synonyms, English and Swahili.
    pub synonyms: Vec<String>,
}

/// The crop lexicon, loaded from the source registry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CropLexicon {
    /// Entries in matching priority order.
    pub crops: Vec<CropEntry>,
}

impl CropLexicon {
    /// Returns the first crop whose synonym appears in the lowercased line.
    #[must_use]
    pub fn matching_crop(&self, line_lower: &str) -> Option<&str> {
        self.crops
            .iter()
            .find(|crop| crop.synonyms.iter().any(|s| line_lower.contains(s.as_str())))
            .map(|crop| crop.key.as_str())
    }
}

/// Extracts per-crop prices from bulletin text.
///
/// Returns a map of crop key → normalized price string. A line with a
/// crop keyword but no parseable number contributes nothing.
#[must_use]
pub fn extract_prices(text: &str, lexicon: &CropLexicon) -> BTreeMap<String, String> {
    let mut prices = BTreeMap::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let lower = line.to_lowercase();
        let Some(crop) = lexicon.matching_crop(&lower) else {
            continue;
        };

        // The line belongs to this crop whether or not it contributes a
        // price; an earlier price is never overwritten.
        if prices.contains_key(crop) {
            continue;
        }

        if let Some(price) = extract_price_from_line(line) {
            prices.insert(crop.to_owned(), price);
        }
    }

    prices
}

/// Pulls a price substring from one line.
///
/// Patterns tried in priority order: `TSh`-prefixed, `$`-prefixed, then
/// a bare number.
#[must_use]
pub fn extract_price_from_line(line: &str) -> Option<String> {
    let tsh = Regex::new(r"(?i)TSH?\s*([\d,]+(?:\.\d{2})?)").unwrap_or_else(|_| unreachable!());
    if let Some(caps) = tsh.captures(line) {
        return Some(format!("TSh {}", &caps[1]));
    }

    let usd = Regex::new(r"\$\s*([\d,]+(?:\.\d{2})?)").unwrap_or_else(|_| unreachable!());
    if let Some(caps) = usd.captures(line) {
        return Some(format!("${}", &caps[1]));
    }

    let bare = Regex::new(r"([\d,]+(?:\.\d{2})?)").unwrap_or_else(|_| unreachable!());
    bare.captures(line).map(|caps| caps[1].to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lexicon() -> CropLexicon {
        CropLexicon {
            crops: vec![
                CropEntry {
                    key: "maize".to_owned(),
                    synonyms: vec!["maize".to_owned(), "mahindi".to_owned(), "corn".to_owned()],
                },
                CropEntry {
                    key: "rice".to_owned(),
                    synonyms: vec![
                        "rice".to_owned(),
                        "mchele".to_owned(),
                        "mpunga".to_owned(),
                    ],
                },
                CropEntry {
                    key: "beans".to_owned(),
                    synonyms: vec!["beans".to_owned(), "maharagwe".to_owned()],
                },
            ],
        }
    }

    #[test]
    fn extracts_prices_by_keyword() {
        let text = "Mahindi kwa gunia TSh 85,000\nMchele bora TSh 210,000\n";
        let prices = extract_prices(text, &lexicon());

        assert_eq!(prices.get("maize").map(String::as_str), Some("TSh 85,000"));
        assert_eq!(prices.get("rice").map(String::as_str), Some("TSh 210,000"));
    }

    #[test]
    fn first_crop_on_a_line_claims_it() {
        // "Mahindi" appears before "mchele" in the lexicon, so the line
        // belongs to maize; rice gets nothing from it.
        let text = "Mahindi na mchele TSh 85,000\n";
        let prices = extract_prices(text, &lexicon());

        assert_eq!(prices.get("maize").map(String::as_str), Some("TSh 85,000"));
        assert!(!prices.contains_key("rice"));
    }

    #[test]
    fn recorded_price_is_never_overwritten() {
        let text = "Mahindi TSh 85,000\nMahindi mpya TSh 99,000\n";
        let prices = extract_prices(text, &lexicon());

        assert_eq!(prices.get("maize").map(String::as_str), Some("TSh 85,000"));
    }

    #[test]
    fn second_crop_cannot_steal_a_claimed_line() {
        // Maize priced on line 1; line 2 mentions maize first and rice
        // second; the line is claimed by maize (already priced), so rice
        // must not consume it.
        let text = "Mahindi TSh 85,000\nMahindi na mchele TSh 210,000\n";
        let prices = extract_prices(text, &lexicon());

        assert_eq!(prices.get("maize").map(String::as_str), Some("TSh 85,000"));
        assert!(!prices.contains_key("rice"));
    }

    #[test]
    fn keyword_without_number_yields_no_entry() {
        let text = "Maharagwe hayapatikani sokoni\n";
        let prices = extract_prices(text, &lexicon());
        assert!(prices.is_empty());
    }

    #[test]
    fn price_pattern_priority() {
        assert_eq!(
            extract_price_from_line("Maize TSh 1,200.50 per kg"),
            Some("TSh 1,200.50".to_owned())
        );
        assert_eq!(
            extract_price_from_line("Maize $45.00 per bag"),
            Some("$45.00".to_owned())
        );
        assert_eq!(
            extract_price_from_line("Maize 1,200 per kg"),
            Some("1,200".to_owned())
        );
        assert_eq!(extract_price_from_line("Maize price unavailable"), None);
    }

    #[test]
    fn tsh_wins_over_bare_number_on_the_same_line() {
        assert_eq!(
            extract_price_from_line("Grade 1 maize TSh 900"),
            Some("TSh 900".to_owned())
        );
    }
}
