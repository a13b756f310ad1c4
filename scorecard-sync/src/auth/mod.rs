//! Caller authentication and capability authorization

pub mod capability;
pub mod identity;

pub use capability::{CapabilityChecker, CapabilityError, HttpCapabilityChecker, SYNC_CAPABILITY};
pub use identity::{CallerIdentity, IdentityVerifier};
