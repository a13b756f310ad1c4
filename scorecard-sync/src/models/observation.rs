//! Metric observation entity and its derived classification types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Provenance discriminator for observations ingested from Google Sheets.
///
/// Currently the only supported source kind; stored on every row so future
/// connectors can coexist in the same table.
pub const SOURCE_KIND: &str = "google_sheets";

/// Display/unit semantics of a metric value.
///
/// Derived by the value normalizer from cell glyphs first, metric-name
/// keywords second. Recomputed on every sync run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Currency,
    Percentage,
    Number,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Currency => "currency",
            MetricKind::Percentage => "percentage",
            MetricKind::Number => "number",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "currency" => Some(MetricKind::Currency),
            "percentage" => Some(MetricKind::Percentage),
            "number" => Some(MetricKind::Number),
            _ => None,
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Reporting bucket assigned by the category classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MetricCategory {
    SpendRevenue,
    CostEfficiency,
    FunnelVolume,
    FunnelConversion,
}

impl MetricCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricCategory::SpendRevenue => "spend-revenue",
            MetricCategory::CostEfficiency => "cost-efficiency",
            MetricCategory::FunnelVolume => "funnel-volume",
            MetricCategory::FunnelConversion => "funnel-conversion",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "spend-revenue" => Some(MetricCategory::SpendRevenue),
            "cost-efficiency" => Some(MetricCategory::CostEfficiency),
            "funnel-volume" => Some(MetricCategory::FunnelVolume),
            "funnel-conversion" => Some(MetricCategory::FunnelConversion),
            _ => None,
        }
    }
}

impl std::fmt::Display for MetricCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The (owner, client, source, sheet) tuple bounding one full-replace sync.
///
/// Cleanup deletes every observation matching this tuple before the new
/// batch is persisted, so two runs over the same scope converge to the
/// same final dataset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SyncScope {
    pub owner_id: String,
    pub client_id: String,
    pub source_id: String,
    pub sheet_name: String,
}

impl std::fmt::Display for SyncScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "owner={} client={} source={} sheet={}",
            self.owner_id, self.client_id, self.source_id, self.sheet_name
        )
    }
}

/// One ingested metric value, the unit of persistence.
///
/// Natural key: (owner_id, client_id, source_id, sheet_name, tab_name,
/// metric_name, observed_on). Observations are created only as batch
/// members during a sync run and deleted only by a later run's cleanup
/// over the same scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricObservation {
    pub owner_id: String,
    pub client_id: String,
    pub source_id: String,
    pub sheet_name: String,
    pub tab_name: String,
    pub tab_ref: String,
    pub source_kind: String,
    pub metric_name: String,
    pub category: MetricCategory,
    pub metric_kind: MetricKind,
    pub value: f64,
    pub observed_on: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl MetricObservation {
    /// Build one observation from a transformed cell within a sync scope.
    pub fn from_cell(
        scope: &SyncScope,
        tab_name: &str,
        tab_ref: &str,
        metric_name: &str,
        category: MetricCategory,
        metric_kind: MetricKind,
        value: f64,
        observed_on: NaiveDate,
    ) -> Self {
        Self {
            owner_id: scope.owner_id.clone(),
            client_id: scope.client_id.clone(),
            source_id: scope.source_id.clone(),
            sheet_name: scope.sheet_name.clone(),
            tab_name: tab_name.to_string(),
            tab_ref: tab_ref.to_string(),
            source_kind: SOURCE_KIND.to_string(),
            metric_name: metric_name.to_string(),
            category,
            metric_kind,
            value,
            observed_on,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_kind_roundtrip() {
        for kind in [
            MetricKind::Currency,
            MetricKind::Percentage,
            MetricKind::Number,
        ] {
            assert_eq!(MetricKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(MetricKind::parse("dollars"), None);
    }

    #[test]
    fn test_metric_kind_serde_lowercase() {
        let json = serde_json::to_string(&MetricKind::Currency).unwrap();
        assert_eq!(json, "\"currency\"");
    }

    #[test]
    fn test_category_roundtrip() {
        for cat in [
            MetricCategory::SpendRevenue,
            MetricCategory::CostEfficiency,
            MetricCategory::FunnelVolume,
            MetricCategory::FunnelConversion,
        ] {
            assert_eq!(MetricCategory::parse(cat.as_str()), Some(cat));
        }
        assert_eq!(MetricCategory::parse("misc"), None);
    }

    #[test]
    fn test_category_serde_kebab_case() {
        let json = serde_json::to_string(&MetricCategory::FunnelConversion).unwrap();
        assert_eq!(json, "\"funnel-conversion\"");
    }

    #[test]
    fn test_scope_equality_is_field_by_field() {
        let a = SyncScope {
            owner_id: "o1".to_string(),
            client_id: "c1".to_string(),
            source_id: "s1".to_string(),
            sheet_name: "January".to_string(),
        };
        let mut b = a.clone();
        b.sheet_name = "February".to_string();
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn test_from_cell_carries_scope_and_source_kind() {
        let scope = SyncScope {
            owner_id: "owner-1".to_string(),
            client_id: "client-1".to_string(),
            source_id: "sheet-abc".to_string(),
            sheet_name: "Q1 Metrics".to_string(),
        };
        let obs = MetricObservation::from_cell(
            &scope,
            "January",
            "tab-0",
            "Ad Spend",
            MetricCategory::SpendRevenue,
            MetricKind::Currency,
            1000.0,
            NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
        );
        assert_eq!(obs.owner_id, "owner-1");
        assert_eq!(obs.sheet_name, "Q1 Metrics");
        assert_eq!(obs.tab_name, "January");
        assert_eq!(obs.source_kind, SOURCE_KIND);
        assert_eq!(obs.metric_kind, MetricKind::Currency);
    }
}
