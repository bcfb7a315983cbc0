//! Ingestion quality scoring.
//!
//! Each document gets a deterministic [0, 1] score from four independent
//! signals, computed once at ingestion time. Downstream consumers use the
//! score to filter training data by how much usable structure survived
//! extraction.

use bei_map_models::ExtractedContent;

/// Text-content signal threshold, in characters.
const MIN_TEXT_LENGTH: usize = 100;

/// Weight for text content longer than [`MIN_TEXT_LENGTH`].
const TEXT_WEIGHT: f64 = 0.3;

/// Weight for at least one extracted price.
const PRICES_WEIGHT: f64 = 0.4;

/// Weight for at least one extracted table.
const TABLES_WEIGHT: f64 = 0.2;

/// Weight for a populated title or author metadata field.
const METADATA_WEIGHT: f64 = 0.1;

/// Scores extracted content on the four quality signals, capped at 1.0.
#[must_use]
pub fn score(extracted: &ExtractedContent) -> f64 {
    let mut score = 0.0;

    if extracted.text_content.len() > MIN_TEXT_LENGTH {
        score += TEXT_WEIGHT;
    }
    if !extracted.prices.is_empty() {
        score += PRICES_WEIGHT;
    }
    if !extracted.tables.is_empty() {
        score += TABLES_WEIGHT;
    }
    if extracted.metadata.title.is_some() || extracted.metadata.author.is_some() {
        score += METADATA_WEIGHT;
    }

    score.min(1.0)
}

#[cfg(test)]
mod tests {
    use bei_map_models::DocumentMetadata;

    use super::*;

    fn full_content() -> ExtractedContent {
        ExtractedContent {
            text_content: "x".repeat(MIN_TEXT_LENGTH + 1),
            tables: vec![vec![vec!["Mahindi".to_owned(), "TSh 85,000".to_owned()]]],
            prices: [("maize".to_owned(), "TSh 85,000".to_owned())]
                .into_iter()
                .collect(),
            metadata: DocumentMetadata {
                title: Some("Bei za Mazao".to_owned()),
                ..DocumentMetadata::default()
            },
            pages: 1,
        }
    }

    #[test]
    fn empty_document_scores_zero() {
        assert!((score(&ExtractedContent::default()) - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn all_signals_score_exactly_one() {
        assert!((score(&full_content()) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn score_stays_within_bounds_for_every_signal_subset() {
        let full = full_content();
        let subsets: Vec<ExtractedContent> = (0..16)
            .map(|mask: u32| ExtractedContent {
                text_content: if mask & 1 == 0 {
                    String::new()
                } else {
                    full.text_content.clone()
                },
                prices: if mask & 2 == 0 {
                    std::collections::BTreeMap::new()
                } else {
                    full.prices.clone()
                },
                tables: if mask & 4 == 0 {
                    Vec::new()
                } else {
                    full.tables.clone()
                },
                metadata: if mask & 8 == 0 {
                    DocumentMetadata::default()
                } else {
                    full.metadata.clone()
                },
                pages: 0,
            })
            .collect();

        for content in &subsets {
            let s = score(content);
            assert!((0.0..=1.0).contains(&s), "score {s} out of bounds");
        }
    }

    #[test]
    fn boundary_text_length_does_not_count() {
        let content = ExtractedContent {
            text_content: "x".repeat(MIN_TEXT_LENGTH),
            ..ExtractedContent::default()
        };
        assert!((score(&content) - 0.0).abs() < f64::EPSILON);
    }
}
