//! Batch transform report
//!
//! Per-row and per-cell faults during the transform phase are isolated
//! rather than fatal. The report aggregates what was kept, dropped, and
//! skipped so operators can observe partial failure rates instead of
//! digging through logs.

use serde::Serialize;

/// How many error samples are retained verbatim before truncating.
const MAX_ERROR_SAMPLES: usize = 5;

/// Outcome counters for one transform pass over fetched rows.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TransformReport {
    /// Data rows fetched from the source (header row excluded).
    pub rows_seen: usize,
    /// Rows dropped by the all-zero row filter.
    pub rows_dropped: usize,
    /// Observations built from surviving rows.
    pub observations_built: usize,
    /// Individual cells skipped due to transform faults.
    pub cells_skipped: usize,
    /// Up to [`MAX_ERROR_SAMPLES`] representative error messages.
    pub error_samples: Vec<String>,
}

impl TransformReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one skipped cell, keeping at most a handful of samples.
    pub fn record_cell_error(&mut self, message: impl Into<String>) {
        self.cells_skipped += 1;
        if self.error_samples.len() < MAX_ERROR_SAMPLES {
            self.error_samples.push(message.into());
        }
    }

    pub fn record_row_kept(&mut self) {
        self.rows_seen += 1;
    }

    pub fn record_row_dropped(&mut self) {
        self.rows_seen += 1;
        self.rows_dropped += 1;
    }

    /// True when at least one cell fault was recorded.
    pub fn has_errors(&self) -> bool {
        self.cells_skipped > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_samples_capped() {
        let mut report = TransformReport::new();
        for i in 0..12 {
            report.record_cell_error(format!("cell fault {}", i));
        }
        assert_eq!(report.cells_skipped, 12);
        assert_eq!(report.error_samples.len(), MAX_ERROR_SAMPLES);
        assert_eq!(report.error_samples[0], "cell fault 0");
    }

    #[test]
    fn test_row_counters() {
        let mut report = TransformReport::new();
        report.record_row_kept();
        report.record_row_kept();
        report.record_row_dropped();
        assert_eq!(report.rows_seen, 3);
        assert_eq!(report.rows_dropped, 1);
        assert!(!report.has_errors());
    }
}
