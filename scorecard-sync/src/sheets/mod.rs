//! External tabular source: Sheets REST client, credential exchange,
//! and retry policy for idempotent reads

pub mod client;
pub mod retry;
pub mod token;

pub use client::{RowSet, SheetSource, SheetTab, SheetsClient, SourceError};
pub use retry::retry_source_read;
pub use token::{TokenError, TokenExchanger};
