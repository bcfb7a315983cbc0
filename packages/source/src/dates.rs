//! Bulletin date heuristic.
//!
//! Listing link texts carry the bulletin date in a loose Swahili form,
//! with irregular punctuation: `"Bei ya Mazao th.06 Agosti ,2025"`,
//! `"Bei za Bidhaa th.30 Julai 2025"`. The primary strategy is a single
//! regex over the whitespace-normalized text; when that misses, a token
//! scan looks for the day, month name, and year independently, in any
//! order. A candidate whose date cannot be resolved must be dropped;
//! dateless documents are never persisted.

use chrono::NaiveDate;
use regex::Regex;

/// Swahili month names mapped to month numbers.
pub const SWAHILI_MONTHS: [(&str, u32); 12] = [
    ("Januari", 1),
    ("Februari", 2),
    ("Machi", 3),
    ("Aprili", 4),
    ("Mei", 5),
    ("Juni", 6),
    ("Julai", 7),
    ("Agosti", 8),
    ("Septemba", 9),
    ("Oktoba", 10),
    ("Novemba", 11),
    ("Desemba", 12),
];

/// Looks up a month number by its Swahili name (exact match).
#[must_use]
pub fn month_number(name: &str) -> Option<u32> {
    SWAHILI_MONTHS
        .iter()
        .find(|(month, _)| *month == name)
        .map(|(_, number)| *number)
}

/// Extracts a bulletin date from listing link text.
///
/// Returns `None` when no date can be resolved or the resolved
/// day/month/year is not a valid calendar date.
#[must_use]
pub fn extract_bulletin_date(text: &str) -> Option<NaiveDate> {
    let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
    extract_with_pattern(&normalized).or_else(|| extract_from_tokens(&normalized))
}

/// Primary strategy: `"th.<day> <month-name> [,]<year>"`.
fn extract_with_pattern(text: &str) -> Option<NaiveDate> {
    let pattern =
        Regex::new(r"th\.(\d+)\s+(\w+)\s*,?\s*(\d{4})").unwrap_or_else(|_| unreachable!());
    let caps = pattern.captures(text)?;

    let day: u32 = caps[1].parse().ok()?;
    let month = month_number(&caps[2])?;
    let year: i32 = caps[3].parse().ok()?;

    NaiveDate::from_ymd_opt(year, month, day)
}

/// Fallback strategy: scan whitespace tokens independently for a day
/// (`th.`-prefixed or bare 1–2 digit), a bare 4-digit year, and a month
/// name, in any order. Later tokens win.
fn extract_from_tokens(text: &str) -> Option<NaiveDate> {
    let mut day: Option<u32> = None;
    let mut month: Option<u32> = None;
    let mut year: Option<i32> = None;

    for token in text.split_whitespace() {
        if let Some(digits) = token.strip_prefix("th.")
            && !digits.is_empty()
            && digits.chars().all(|c| c.is_ascii_digit())
        {
            day = digits.parse().ok();
        } else if token.chars().all(|c| c.is_ascii_digit()) && (1..=2).contains(&token.len()) {
            day = token.parse().ok();
        } else if token.chars().all(|c| c.is_ascii_digit()) && token.len() == 4 {
            year = token.parse().ok();
        } else if let Some(number) = month_number(token) {
            month = Some(number);
        }
    }

    NaiveDate::from_ymd_opt(year?, month?, day?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_every_month_in_both_supported_forms() {
        for (month_name, month) in SWAHILI_MONTHS {
            let expected = format!("2025-{month:02}-07");

            let with_comma = format!("Bei ya Mazao th.07 {month_name} ,2025");
            let date = extract_bulletin_date(&with_comma).unwrap();
            assert_eq!(date.format("%Y-%m-%d").to_string(), expected);

            let without_comma = format!("Bei ya Mazao th.07 {month_name} 2025");
            let date = extract_bulletin_date(&without_comma).unwrap();
            assert_eq!(date.format("%Y-%m-%d").to_string(), expected);
        }
    }

    #[test]
    fn zero_pads_single_digit_days() {
        let date = extract_bulletin_date("Bei ya Mazao th.6 Agosti ,2025").unwrap();
        assert_eq!(date.format("%Y-%m-%d").to_string(), "2025-08-06");
    }

    #[test]
    fn survives_irregular_whitespace() {
        let date = extract_bulletin_date("Bei ya Mazao\n  th.30   Julai\t2025").unwrap();
        assert_eq!(date.format("%Y-%m-%d").to_string(), "2025-07-30");
    }

    #[test]
    fn falls_back_to_token_scan() {
        let date = extract_bulletin_date("Taarifa ya bei 14 Agosti 2025").unwrap();
        assert_eq!(date.format("%Y-%m-%d").to_string(), "2025-08-14");

        // Order independent.
        let date = extract_bulletin_date("2025 Agosti taarifa 14").unwrap();
        assert_eq!(date.format("%Y-%m-%d").to_string(), "2025-08-14");
    }

    #[test]
    fn unknown_month_name_is_unresolvable() {
        assert!(extract_bulletin_date("Bei ya Mazao th.06 August ,2025").is_none());
    }

    #[test]
    fn calendar_invalid_dates_are_rejected() {
        assert!(extract_bulletin_date("Bei ya Mazao th.45 Agosti ,2025").is_none());
        assert!(extract_bulletin_date("Bei ya Mazao th.31 Februari ,2025").is_none());
    }

    #[test]
    fn text_without_any_date_parts_is_unresolvable() {
        assert!(extract_bulletin_date("Taarifa kwa Umma").is_none());
        assert!(extract_bulletin_date("").is_none());
    }
}
