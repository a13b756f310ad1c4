//! Transform phase: fetched rows to metric observations
//!
//! Resolves the date column once, applies the row filter, then builds
//! one observation per surviving non-date cell. Faults stay row- or
//! cell-local and are tallied in the report; the batch as a whole never
//! aborts here.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};

use crate::models::{MetricObservation, SyncScope, TransformReport};
use crate::normalize::{
    classify_metric, is_meaningful_row, normalize_date, normalize_value, resolve_date_column,
};
use crate::sheets::RowSet;

/// Everything the persist phase needs from one transform pass.
#[derive(Debug)]
pub struct TransformOutcome {
    pub observations: Vec<MetricObservation>,
    pub report: TransformReport,
}

/// Transform a fetched row set into observations for one scope.
///
/// Sheets without any date-like header date every row at processing time
/// and treat every column as data. Rows that collide on (metric, date)
/// keep the later row's value, matching what the store's upsert would do
/// anyway, and the collision is recorded in the report.
pub fn transform_rows(
    scope: &SyncScope,
    tab_name: &str,
    tab_ref: &str,
    rows: &RowSet,
    month_first: bool,
) -> TransformOutcome {
    let date_column = resolve_date_column(&rows.headers);
    let date_column_name = date_column.as_deref().unwrap_or("");

    let mut report = TransformReport::new();
    let mut observations: Vec<MetricObservation> = Vec::new();
    let mut seen: HashMap<(String, NaiveDate), usize> = HashMap::new();

    for row in &rows.rows {
        let observed_on = match &date_column {
            Some(column) => {
                let cell = row.get(column).map(String::as_str).unwrap_or("");
                normalize_date(cell, month_first)
            }
            None => Utc::now().date_naive(),
        };

        if !is_meaningful_row(&rows.headers, row, date_column_name) {
            report.record_row_dropped();
            continue;
        }
        report.record_row_kept();

        for header in &rows.headers {
            if header.as_str() == date_column_name {
                continue;
            }

            let cell = row.get(header).map(String::as_str).unwrap_or("");
            let parsed = normalize_value(cell, header);
            let category = classify_metric(header);
            let observation = MetricObservation::from_cell(
                scope,
                tab_name,
                tab_ref,
                header,
                category,
                parsed.kind,
                parsed.value,
                observed_on,
            );

            let key = (header.clone(), observed_on);
            match seen.get(&key) {
                Some(&index) => {
                    report.record_cell_error(format!(
                        "Duplicate value for '{}' on {}; keeping the later row",
                        header, observed_on
                    ));
                    observations[index] = observation;
                }
                None => {
                    seen.insert(key, observations.len());
                    observations.push(observation);
                }
            }
        }
    }

    report.observations_built = observations.len();
    TransformOutcome {
        observations,
        report,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MetricCategory, MetricKind};

    fn scope() -> SyncScope {
        SyncScope {
            owner_id: "owner-1".to_string(),
            client_id: "client-1".to_string(),
            source_id: "sheet-abc".to_string(),
            sheet_name: "Q1 Metrics".to_string(),
        }
    }

    fn row_set(headers: &[&str], data: &[&[&str]]) -> RowSet {
        let headers: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
        let rows = data
            .iter()
            .map(|cells| {
                headers
                    .iter()
                    .cloned()
                    .zip(cells.iter().map(|c| c.to_string()))
                    .collect()
            })
            .collect();
        RowSet { headers, rows }
    }

    #[test]
    fn test_one_row_yields_observation_per_data_column() {
        let rows = row_set(
            &["Date", "Ad Spend", "Close Rate"],
            &[&["01/15/2025", "$1,000", "25%"]],
        );
        let outcome = transform_rows(&scope(), "January", "0", &rows, true);

        assert_eq!(outcome.observations.len(), 2);
        assert_eq!(outcome.report.rows_seen, 1);
        assert_eq!(outcome.report.rows_dropped, 0);

        let spend = &outcome.observations[0];
        assert_eq!(spend.metric_name, "Ad Spend");
        assert_eq!(spend.value, 1000.0);
        assert_eq!(spend.metric_kind, MetricKind::Currency);
        assert_eq!(spend.category, MetricCategory::SpendRevenue);
        assert_eq!(
            spend.observed_on,
            NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
        );

        let close = &outcome.observations[1];
        assert_eq!(close.metric_name, "Close Rate");
        assert_eq!(close.value, 25.0);
        assert_eq!(close.metric_kind, MetricKind::Percentage);
        assert_eq!(close.category, MetricCategory::FunnelConversion);
    }

    #[test]
    fn test_all_zero_row_dropped() {
        let rows = row_set(
            &["Date", "Ad Spend", "Leads"],
            &[
                &["01/15/2025", "$1,000", "3"],
                &["01/16/2025", "", "-"],
            ],
        );
        let outcome = transform_rows(&scope(), "January", "0", &rows, true);

        assert_eq!(outcome.report.rows_seen, 2);
        assert_eq!(outcome.report.rows_dropped, 1);
        assert_eq!(outcome.observations.len(), 2);
        assert!(outcome
            .observations
            .iter()
            .all(|o| o.observed_on == NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()));
    }

    #[test]
    fn test_zero_cell_in_kept_row_is_persisted() {
        let rows = row_set(
            &["Date", "Ad Spend", "Leads"],
            &[&["01/15/2025", "$0", "3"]],
        );
        let outcome = transform_rows(&scope(), "January", "0", &rows, true);

        assert_eq!(outcome.observations.len(), 2);
        let spend = outcome
            .observations
            .iter()
            .find(|o| o.metric_name == "Ad Spend")
            .unwrap();
        assert_eq!(spend.value, 0.0);
    }

    #[test]
    fn test_duplicate_date_keeps_later_row_and_reports() {
        let rows = row_set(
            &["Date", "Leads"],
            &[&["01/15/2025", "3"], &["01/15/2025", "7"]],
        );
        let outcome = transform_rows(&scope(), "January", "0", &rows, true);

        assert_eq!(outcome.observations.len(), 1);
        assert_eq!(outcome.observations[0].value, 7.0);
        assert_eq!(outcome.report.cells_skipped, 1);
        assert!(outcome.report.error_samples[0].contains("Leads"));
    }

    #[test]
    fn test_missing_date_column_dates_rows_today() {
        let rows = row_set(&["Ad Spend", "Leads"], &[&["$1,000", "3"]]);
        let today = Utc::now().date_naive();
        let outcome = transform_rows(&scope(), "January", "0", &rows, true);

        assert_eq!(outcome.observations.len(), 2);
        assert!(outcome.observations.iter().all(|o| o.observed_on == today));
    }

    #[test]
    fn test_serial_dates_resolve() {
        let rows = row_set(&["Date", "Leads"], &[&["45672", "3"]]);
        let outcome = transform_rows(&scope(), "January", "0", &rows, true);
        assert_eq!(
            outcome.observations[0].observed_on,
            NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
        );
    }

    #[test]
    fn test_scope_stamped_on_every_observation() {
        let rows = row_set(
            &["Date", "Ad Spend", "Leads"],
            &[&["01/15/2025", "$1,000", "3"]],
        );
        let outcome = transform_rows(&scope(), "January", "tab-1", &rows, true);
        for obs in &outcome.observations {
            assert_eq!(obs.owner_id, "owner-1");
            assert_eq!(obs.sheet_name, "Q1 Metrics");
            assert_eq!(obs.tab_name, "January");
            assert_eq!(obs.tab_ref, "tab-1");
            assert_eq!(obs.source_kind, crate::models::SOURCE_KIND);
        }
    }
}
