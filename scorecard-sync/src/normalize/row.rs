//! Row-level policy: date column resolution and the all-zero filter
//!
//! Template sheets carry pre-built rows for future periods with a date
//! and nothing else. Dropping rows whose every non-date cell normalizes
//! to zero keeps those out of the store while preserving real zero
//! observations that sit next to nonzero ones.

use std::collections::HashMap;

use crate::normalize::value::normalize_value;

/// Pick the header that carries the row's reporting date.
///
/// Exact (case-insensitive) `date` wins; otherwise the first header
/// containing `date` in document order.
pub fn resolve_date_column(headers: &[String]) -> Option<String> {
    if let Some(exact) = headers.iter().find(|h| h.trim().eq_ignore_ascii_case("date")) {
        return Some(exact.clone());
    }
    headers
        .iter()
        .find(|h| h.to_lowercase().contains("date"))
        .cloned()
}

/// Decide whether a row holds real data.
///
/// Every non-date cell runs through the value normalizer; the row is kept
/// if any result is nonzero. Evaluated once per row before observations
/// are built.
pub fn is_meaningful_row(
    headers: &[String],
    row: &HashMap<String, String>,
    date_column: &str,
) -> bool {
    headers
        .iter()
        .filter(|header| header.as_str() != date_column)
        .any(|header| {
            let cell = row.get(header).map(String::as_str).unwrap_or("");
            normalize_value(cell, header).value != 0.0
        })
}
