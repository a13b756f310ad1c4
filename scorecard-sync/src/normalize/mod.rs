//! Cell-level normalization pipeline
//!
//! Turns raw spreadsheet text into typed numeric observations: value
//! parsing with kind inference, date canonicalization, category
//! classification, and the all-zero row filter. Every function here is
//! total; bad input degrades to a documented fallback instead of an error.

pub mod category;
pub mod date;
pub mod row;
pub mod value;

pub use category::classify_metric;
pub use date::normalize_date;
pub use row::{is_meaningful_row, resolve_date_column};
pub use value::{normalize_value, NormalizedValue};
