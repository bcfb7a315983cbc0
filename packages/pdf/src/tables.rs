//! Line-based pseudo-column table recovery from extracted PDF text.
//!
//! Bulletin tables survive text extraction as lines whose cells are
//! separated by tab characters or runs of two-plus spaces. Splitting on
//! those separators recovers a usable rows-of-cells structure without any
//! layout analysis.

use regex::Regex;

/// Recovers a table from one page of extracted text.
///
/// Lines containing a tab or a run of ≥2 spaces are split into cells;
/// empty cells are dropped. Returns `None` when the page yields no rows.
#[must_use]
pub fn find_table(page_text: &str) -> Option<Vec<Vec<String>>> {
    let separator = Regex::new(r"\t| {2,}").unwrap_or_else(|_| unreachable!());

    let rows: Vec<Vec<String>> = page_text
        .lines()
        .filter(|line| line.contains('\t') || line.contains("  "))
        .filter_map(|line| {
            let cells: Vec<String> = separator
                .split(line)
                .map(str::trim)
                .filter(|cell| !cell.is_empty())
                .map(ToOwned::to_owned)
                .collect();
            if cells.len() > 1 { Some(cells) } else { None }
        })
        .collect();

    if rows.is_empty() { None } else { Some(rows) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_space_aligned_rows() {
        let page = "BEI ZA MAZAO KWA SIKU\n\
                    Zao        Kipimo     Bei ya Jumla\n\
                    Mahindi    100kg      TSh 85,000\n\
                    Mchele     100kg      TSh 210,000\n";

        let table = find_table(page).unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table[1], vec!["Mahindi", "100kg", "TSh 85,000"]);
    }

    #[test]
    fn recovers_tab_delimited_rows() {
        let page = "Zao\tBei\nMahindi\tTSh 85,000\n";
        let table = find_table(page).unwrap();
        assert_eq!(table, vec![vec!["Zao", "Bei"], vec!["Mahindi", "TSh 85,000"]]);
    }

    #[test]
    fn prose_page_yields_no_table() {
        let page = "This bulletin summarises wholesale prices observed in major markets.";
        assert!(find_table(page).is_none());
    }
}
