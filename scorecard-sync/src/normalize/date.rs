//! Date normalization: heterogeneous date cells to a calendar date
//!
//! Handles spreadsheet serial day counts, ISO dates, and slash/dash
//! separated dates. Whether an ambiguous `01/02/2025` reads month-first
//! is a configured policy, not a guess from content. Unparsable input
//! falls back to the processing date rather than failing the row.

use chrono::{Days, NaiveDate, Utc};

/// Serial day 0 in the spreadsheet encoding Google Sheets and Excel share.
///
/// The epoch is 1899-12-30 (not -31) so serial 1 lands on 1899-12-31 and
/// the inherited Lotus leap-year quirk cancels out for modern dates.
fn serial_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1899, 12, 30).expect("fixed epoch date is valid")
}

/// Normalize one raw date cell into a calendar date.
///
/// Strategies in order: numeric serial day count, ISO `YYYY-MM-DD`, then
/// a three-part split on `/` or `-` (four-digit first part means
/// year-first, otherwise `month_first` decides). Anything else resolves
/// to today.
pub fn normalize_date(raw: &str, month_first: bool) -> NaiveDate {
    let trimmed = raw.trim();

    if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
        if let Some(date) = from_serial(trimmed) {
            return date;
        }
    }

    if let Ok(date) = trimmed.parse::<NaiveDate>() {
        return date;
    }

    if let Some(date) = from_parts(trimmed, month_first) {
        return date;
    }

    let today = Utc::now().date_naive();
    tracing::warn!(cell = raw, fallback = %today, "Unparsable date cell, using processing date");
    today
}

fn from_serial(digits: &str) -> Option<NaiveDate> {
    let serial: u64 = digits.parse().ok()?;
    serial_epoch().checked_add_days(Days::new(serial))
}

fn from_parts(text: &str, month_first: bool) -> Option<NaiveDate> {
    let parts: Vec<&str> = text.split(['/', '-']).map(str::trim).collect();
    if parts.len() != 3 {
        return None;
    }

    let first: u32 = parts[0].parse().ok()?;
    let second: u32 = parts[1].parse().ok()?;
    let third: u32 = parts[2].parse().ok()?;

    let (year, month, day) = if parts[0].len() == 4 {
        (first, second, third)
    } else if month_first {
        (third, first, second)
    } else {
        (third, second, first)
    };

    // Two-digit years pivot into the 2000s.
    let year = if year < 100 { year + 2000 } else { year };

    NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serial_day_count() {
        // 45658 is 2025-01-01 in the shared spreadsheet encoding.
        assert_eq!(
            normalize_date("45658", true),
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
        );
        assert_eq!(
            normalize_date("45672", true),
            NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
        );
        assert_eq!(
            normalize_date("45292", true),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );
    }

    #[test]
    fn test_serial_epoch_quirk() {
        assert_eq!(
            normalize_date("1", true),
            NaiveDate::from_ymd_opt(1899, 12, 31).unwrap()
        );
    }

    #[test]
    fn test_iso_date() {
        assert_eq!(
            normalize_date("2025-01-15", true),
            NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
        );
    }

    #[test]
    fn test_month_first_slash_date() {
        assert_eq!(
            normalize_date("01/15/2025", true),
            NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
        );
    }

    #[test]
    fn test_day_first_policy() {
        assert_eq!(
            normalize_date("15/01/2025", false),
            NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
        );
    }

    #[test]
    fn test_year_first_without_zero_padding() {
        assert_eq!(
            normalize_date("2025-1-5", true),
            NaiveDate::from_ymd_opt(2025, 1, 5).unwrap()
        );
    }

    #[test]
    fn test_two_digit_year_pivots_forward() {
        assert_eq!(
            normalize_date("01/15/25", true),
            NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
        );
    }

    #[test]
    fn test_unparsable_falls_back_to_today() {
        let before = Utc::now().date_naive();
        let resolved = normalize_date("sometime soon", true);
        let after = Utc::now().date_naive();
        assert!(resolved == before || resolved == after);
    }

    #[test]
    fn test_impossible_calendar_date_falls_back_to_today() {
        let before = Utc::now().date_naive();
        let resolved = normalize_date("13/45/2025", true);
        let after = Utc::now().date_naive();
        assert!(resolved == before || resolved == after);
    }

    #[test]
    fn test_oversized_year_falls_back_to_today() {
        // A year past i32 range must not wrap into an ancient date.
        let before = Utc::now().date_naive();
        let resolved = normalize_date("01/15/4294967295", true);
        let after = Utc::now().date_naive();
        assert!(resolved == before || resolved == after);
    }
}
