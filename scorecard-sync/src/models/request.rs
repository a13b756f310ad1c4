//! Sync request envelope and its validated command form
//!
//! The wire envelope accepts every field as optional so malformed requests
//! reach our own validation (and its 400 responses) instead of being
//! rejected by the extractor. `into_command` turns the envelope into a
//! tagged command with the per-variant required fields checked up front.

use serde::{Deserialize, Serialize};

use crate::error::SyncError;
use crate::models::observation::SyncScope;

/// Who the sync run is scoped to.
///
/// `Client` runs ingest data for one client of the owner and require a
/// `client_id`; `Admin` runs ingest owner-level data and leave the client
/// component of the scope empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    Client,
    Admin,
}

impl SyncMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncMode::Client => "client",
            SyncMode::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "client" => Some(SyncMode::Client),
            "admin" => Some(SyncMode::Admin),
            _ => None,
        }
    }
}

/// Raw request body for `POST /api/sync`.
///
/// One envelope serves both the discovery and sync variants; the
/// `discover_sheets_only` flag selects which required-field set applies.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SyncEnvelope {
    pub owner_id: Option<String>,
    pub client_id: Option<String>,
    pub source_id: Option<String>,
    pub sheet_name: Option<String>,
    pub tab_name: Option<String>,
    pub tab_ref: Option<String>,
    pub mode: Option<String>,
    #[serde(default)]
    pub discover_sheets_only: bool,
}

/// List available tabs without touching the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoverCommand {
    pub owner_id: String,
    pub source_id: String,
}

/// Full-replace sync of one scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaceCommand {
    pub scope: SyncScope,
    pub tab_name: Option<String>,
    pub tab_ref: Option<String>,
    pub mode: SyncMode,
}

/// Validated request, dispatched explicitly instead of via optional-flag
/// branching downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncCommand {
    Discover(DiscoverCommand),
    Replace(ReplaceCommand),
}

impl SyncEnvelope {
    /// Validate the envelope and produce the tagged command.
    ///
    /// Fails with a 400-family error before any network or store access.
    pub fn into_command(self) -> Result<SyncCommand, SyncError> {
        let owner_id = require_field(self.owner_id, "owner_id")?;
        let source_id = require_field(self.source_id, "source_id")?;

        if self.discover_sheets_only {
            return Ok(SyncCommand::Discover(DiscoverCommand {
                owner_id,
                source_id,
            }));
        }

        let sheet_name = require_field(self.sheet_name, "sheet_name")?;
        let mode_raw = require_field(self.mode, "mode")?;
        let mode = SyncMode::parse(&mode_raw).ok_or_else(|| {
            SyncError::Validation(format!(
                "Invalid mode '{}': expected 'client' or 'admin'",
                mode_raw
            ))
        })?;

        let client_id = match mode {
            SyncMode::Client => require_field(self.client_id, "client_id")?,
            SyncMode::Admin => self.client_id.unwrap_or_default(),
        };

        Ok(SyncCommand::Replace(ReplaceCommand {
            scope: SyncScope {
                owner_id,
                client_id,
                source_id,
                sheet_name,
            },
            tab_name: self.tab_name,
            tab_ref: self.tab_ref,
            mode,
        }))
    }
}

fn require_field(value: Option<String>, name: &str) -> Result<String, SyncError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(SyncError::Validation(format!(
            "Missing required field: {}",
            name
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_envelope() -> SyncEnvelope {
        SyncEnvelope {
            owner_id: Some("owner-1".to_string()),
            client_id: Some("client-1".to_string()),
            source_id: Some("sheet-abc".to_string()),
            sheet_name: Some("Q1 Metrics".to_string()),
            tab_name: Some("January".to_string()),
            tab_ref: Some("tab-0".to_string()),
            mode: Some("client".to_string()),
            discover_sheets_only: false,
        }
    }

    #[test]
    fn test_full_envelope_becomes_replace_command() {
        let cmd = full_envelope().into_command().unwrap();
        match cmd {
            SyncCommand::Replace(replace) => {
                assert_eq!(replace.scope.owner_id, "owner-1");
                assert_eq!(replace.scope.client_id, "client-1");
                assert_eq!(replace.scope.sheet_name, "Q1 Metrics");
                assert_eq!(replace.mode, SyncMode::Client);
                assert_eq!(replace.tab_name.as_deref(), Some("January"));
            }
            other => panic!("expected Replace, got {:?}", other),
        }
    }

    #[test]
    fn test_discovery_needs_only_owner_and_source() {
        let envelope = SyncEnvelope {
            owner_id: Some("owner-1".to_string()),
            source_id: Some("sheet-abc".to_string()),
            discover_sheets_only: true,
            ..Default::default()
        };
        let cmd = envelope.into_command().unwrap();
        match cmd {
            SyncCommand::Discover(discover) => {
                assert_eq!(discover.owner_id, "owner-1");
                assert_eq!(discover.source_id, "sheet-abc");
            }
            other => panic!("expected Discover, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_owner_id_rejected() {
        let mut envelope = full_envelope();
        envelope.owner_id = None;
        let err = envelope.into_command().unwrap_err();
        assert!(matches!(err, SyncError::Validation(_)));
        assert!(err.to_string().contains("owner_id"));
    }

    #[test]
    fn test_blank_source_id_rejected() {
        let mut envelope = full_envelope();
        envelope.source_id = Some("   ".to_string());
        let err = envelope.into_command().unwrap_err();
        assert!(err.to_string().contains("source_id"));
    }

    #[test]
    fn test_sync_without_sheet_name_rejected() {
        let mut envelope = full_envelope();
        envelope.sheet_name = None;
        let err = envelope.into_command().unwrap_err();
        assert!(err.to_string().contains("sheet_name"));
    }

    #[test]
    fn test_unknown_mode_rejected() {
        let mut envelope = full_envelope();
        envelope.mode = Some("superuser".to_string());
        let err = envelope.into_command().unwrap_err();
        assert!(err.to_string().contains("superuser"));
    }

    #[test]
    fn test_client_mode_requires_client_id() {
        let mut envelope = full_envelope();
        envelope.client_id = None;
        let err = envelope.into_command().unwrap_err();
        assert!(err.to_string().contains("client_id"));
    }

    #[test]
    fn test_admin_mode_defaults_client_id_empty() {
        let mut envelope = full_envelope();
        envelope.mode = Some("admin".to_string());
        envelope.client_id = None;
        let cmd = envelope.into_command().unwrap();
        match cmd {
            SyncCommand::Replace(replace) => {
                assert_eq!(replace.scope.client_id, "");
                assert_eq!(replace.mode, SyncMode::Admin);
            }
            other => panic!("expected Replace, got {:?}", other),
        }
    }

    #[test]
    fn test_envelope_deserializes_without_flag() {
        let envelope: SyncEnvelope =
            serde_json::from_str(r#"{"owner_id":"o","source_id":"s"}"#).unwrap();
        assert!(!envelope.discover_sheets_only);
        assert_eq!(envelope.owner_id.as_deref(), Some("o"));
    }
}
