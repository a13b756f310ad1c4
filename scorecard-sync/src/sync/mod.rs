//! Sync run coordination: per-scope locking, row transform, and the
//! phase orchestrator

pub mod orchestrator;
pub mod scope_locks;
pub mod transform;

pub use orchestrator::{RunOutput, SyncOrchestrator, SyncPolicy};
pub use scope_locks::ScopeLocks;
pub use transform::{transform_rows, TransformOutcome};
