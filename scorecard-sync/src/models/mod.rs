//! Data models for the sheet sync pipeline

pub mod observation;
pub mod report;
pub mod request;

pub use observation::{MetricCategory, MetricKind, MetricObservation, SyncScope, SOURCE_KIND};
pub use report::TransformReport;
pub use request::{DiscoverCommand, ReplaceCommand, SyncCommand, SyncEnvelope, SyncMode};
