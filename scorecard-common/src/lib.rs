//! # Scorecard Common Library
//!
//! Shared code for Scorecard backend services including:
//! - Common error types
//! - Settings loading and data folder resolution
//! - Database pool bootstrap and metric store schema

pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};
