//! Category classification: metric name to reporting bucket
//!
//! Keyword matching over an ordered rule table. Earlier rules win, so
//! "Cost Per Lead" lands in cost-efficiency before the volume rule can
//! see "lead". The table is data so new synonyms extend a list instead
//! of the control flow.

use crate::models::MetricCategory;

/// Ordered precedence table. First rule whose keyword list matches wins.
/// Counter keywords are plural so "Conversions" stays in funnel-volume
/// while "Conversion Rate" falls through to funnel-conversion.
const CATEGORY_RULES: &[(MetricCategory, &[&str])] = &[
    (
        MetricCategory::SpendRevenue,
        &[
            "spend",
            "revenue",
            "budget",
            "income",
            "sales",
            "profit",
            "collected",
            "cash",
        ],
    ),
    (
        MetricCategory::CostEfficiency,
        &[
            "cost", "cpl", "cpa", "cpc", "cac", "roas", "roi", "efficiency",
        ],
    ),
    (
        MetricCategory::FunnelVolume,
        &[
            "leads",
            "impressions",
            "clicks",
            "calls",
            "appointments",
            "shows",
            "visits",
            "sessions",
            "conversions",
            "units",
            "demos",
            "traffic",
        ],
    ),
    (
        MetricCategory::FunnelConversion,
        &["rate", "ratio", "percent", "conversion", "close", "ctr", "cvr"],
    ),
];

/// Map a metric display name to its reporting bucket.
///
/// Total and deterministic: every name yields exactly one category, with
/// spend-revenue as the default when nothing matches.
pub fn classify_metric(metric_name: &str) -> MetricCategory {
    let name = metric_name.to_lowercase();

    for (category, keywords) in CATEGORY_RULES {
        if keywords.iter().any(|keyword| name.contains(keyword)) {
            return *category;
        }
    }

    MetricCategory::SpendRevenue
}
