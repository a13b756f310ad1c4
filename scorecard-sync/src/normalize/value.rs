//! Value normalization: raw cell text to a numeric value plus kind
//!
//! Glyphs in the cell text win over name-based inference: a `$` forces
//! currency and a `%` forces percentage no matter what the column is
//! called. Only glyph-free cells fall back to keyword matching on the
//! metric name. The function is total: anything unparsable becomes `0`
//! so downstream aggregation stays closed over the whole batch.

use crate::models::MetricKind;

/// Glyphs that force [`MetricKind::Currency`].
const CURRENCY_GLYPHS: [char; 3] = ['$', '€', '£'];

/// Metric-name keywords checked in order when no glyph decided the kind.
/// Counter terms are plural so "Conversions" reads as a count while
/// "Conversion Rate" falls through to the percentage terms.
const COUNTER_TERMS: &[&str] = &[
    "conversions",
    "impressions",
    "clicks",
    "leads",
    "calls",
    "appointments",
    "shows",
    "visits",
    "sessions",
    "units",
    "count",
];

const PERCENT_TERMS: &[&str] = &["rate", "percent", "percentage", "ratio", "ctr", "cvr"];

const CURRENCY_TERMS: &[&str] = &[
    "spend", "cost", "revenue", "budget", "price", "profit", "income", "cpl", "cpa", "cpc", "cac",
];

/// A parsed cell: the numeric value and its inferred kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedValue {
    pub value: f64,
    pub kind: MetricKind,
}

/// Parse one raw cell into a numeric value and kind.
///
/// Percentages keep their face value (`"12.5%"` parses to `12.5`, not
/// `0.125`). Parenthesized numerals negate. Never fails; empty, dash-only,
/// and garbage cells all normalize to `0` with a name-derived kind.
pub fn normalize_value(raw: &str, metric_name: &str) -> NormalizedValue {
    let trimmed = raw.trim();

    if trimmed.is_empty() || trimmed == "-" {
        return NormalizedValue {
            value: 0.0,
            kind: kind_from_name(metric_name),
        };
    }

    // Accounting-style negation: (1,234) means -1234.
    let (text, negated) = match trimmed.strip_prefix('(').and_then(|t| t.strip_suffix(')')) {
        Some(inner) => (inner, true),
        None => (trimmed, false),
    };

    let mut kind = None;
    if text.contains(&CURRENCY_GLYPHS[..]) {
        kind = Some(MetricKind::Currency);
    }
    if text.contains('%') {
        kind = Some(MetricKind::Percentage);
    }

    let cleaned: String = text
        .chars()
        .filter(|c| !CURRENCY_GLYPHS.contains(c) && *c != '%' && *c != ',' && !c.is_whitespace())
        .collect();

    let magnitude = cleaned.parse::<f64>().ok().filter(|v| v.is_finite());
    let value = match magnitude {
        Some(v) if negated => -v,
        Some(v) => v,
        None => 0.0,
    };

    NormalizedValue {
        value,
        kind: kind.unwrap_or_else(|| kind_from_name(metric_name)),
    }
}

/// Infer a kind from the metric name alone.
///
/// Checked in order: counter terms, then percentage terms, then currency
/// terms; anything unmatched defaults to a plain number.
pub fn kind_from_name(metric_name: &str) -> MetricKind {
    let name = metric_name.to_lowercase();

    if COUNTER_TERMS.iter().any(|term| name.contains(term)) {
        return MetricKind::Number;
    }
    if PERCENT_TERMS.iter().any(|term| name.contains(term)) {
        return MetricKind::Percentage;
    }
    if CURRENCY_TERMS.iter().any(|term| name.contains(term)) {
        return MetricKind::Currency;
    }

    MetricKind::Number
}
