//! Metric store access for the sync service

pub mod observations;

pub use observations::{bulk_upsert, count_scope, delete_scope, fetch_scope};
