//! Trend matching against the price dataset
//!
//! Resolves a free-text query to the first dataset row whose keyword and the
//! query contain one another after normalization. This is a deliberately loose
//! containment check with no similarity ranking: stored order decides ties.

use tracing::debug;

use crate::data::{PriceDataset, TrendRecord};

/// Lower-cases `text` and strips all whitespace
///
/// # Example
///
/// ```
/// use pricescout::matcher::normalize;
///
/// assert_eq!(normalize(" iPhone 15 Pro "), "iphone15pro");
/// ```
pub fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Finds the trend record for `query`
///
/// Scans rows in stored order and returns the first one whose normalized
/// keyword is contained in the normalized query, or contains it. Rows whose
/// prices do not parse are skipped and the scan continues.
///
/// # Returns
/// * `Some(TrendRecord)` - The first qualifying row
/// * `None` - Empty dataset, blank query, or no qualifying row
pub fn match_trend(query: &str, dataset: &PriceDataset) -> Option<TrendRecord> {
    if dataset.is_empty() {
        return None;
    }
    let query = normalize(query);
    if query.is_empty() {
        return None;
    }

    for (index, row) in dataset.rows().enumerate() {
        let keyword = normalize(&row.keyword);
        // An empty keyword is contained in every query
        if keyword.is_empty() {
            continue;
        }
        if !query.contains(&keyword) && !keyword.contains(&query) {
            continue;
        }

        match TrendRecord::from_row(row) {
            Ok(record) => {
                debug!(index, keyword = %row.keyword, "Matched trend row");
                return Some(record);
            }
            Err(e) => {
                debug!(index, keyword = %row.keyword, error = %e, "Skipping malformed row");
            }
        }
    }

    None
}
