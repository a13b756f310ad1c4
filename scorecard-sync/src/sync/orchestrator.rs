//! Sync run orchestration
//!
//! Drives one request through the protocol's phases: validate the
//! envelope, authenticate the caller, authorize against the permission
//! service, then either list tabs (discovery) or run the full-replace
//! pipeline: claim the scope, clean, fetch, transform, persist. Every
//! phase failure maps to one failure family in [`SyncError`].

use std::sync::Arc;
use std::time::Duration;

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::auth::{CapabilityChecker, IdentityVerifier, SYNC_CAPABILITY};
use crate::db;
use crate::error::{SyncError, SyncResult};
use crate::models::{DiscoverCommand, ReplaceCommand, SyncCommand, SyncEnvelope, TransformReport};
use crate::sheets::{retry_source_read, SheetSource, SheetTab};
use crate::sync::scope_locks::ScopeLocks;
use crate::sync::transform::transform_rows;

/// Tuning the orchestrator takes from service configuration.
#[derive(Debug, Clone)]
pub struct SyncPolicy {
    /// Cell range fetched from each tab.
    pub fetch_range: String,
    /// Whether ambiguous slash dates read month-first.
    pub month_first: bool,
    /// Total attempts for idempotent source reads.
    pub retry_attempts: u32,
    /// Initial backoff between read attempts.
    pub retry_base: Duration,
}

/// Terminal result of a successful run.
pub enum RunOutput {
    /// Discovery: available tabs, store untouched.
    Sheets(Vec<SheetTab>),
    /// Full-replace sync: observations written plus the transform report.
    Synced {
        processed: usize,
        report: TransformReport,
    },
}

/// Coordinates sync runs against the store, source, and permission service.
pub struct SyncOrchestrator {
    pool: SqlitePool,
    source: Arc<dyn SheetSource>,
    capabilities: Arc<dyn CapabilityChecker>,
    identity: IdentityVerifier,
    locks: ScopeLocks,
    policy: SyncPolicy,
}

impl SyncOrchestrator {
    pub fn new(
        pool: SqlitePool,
        source: Arc<dyn SheetSource>,
        capabilities: Arc<dyn CapabilityChecker>,
        identity: IdentityVerifier,
        policy: SyncPolicy,
    ) -> Self {
        Self {
            pool,
            source,
            capabilities,
            identity,
            locks: ScopeLocks::new(),
            policy,
        }
    }

    /// Run one sync request end to end.
    ///
    /// `bearer` is the raw `Authorization` header value, if any. Shape
    /// validation runs before authentication, so a malformed envelope is
    /// reported as such even when the credential is also bad.
    pub async fn run(&self, bearer: Option<&str>, envelope: SyncEnvelope) -> SyncResult<RunOutput> {
        let run_id = Uuid::new_v4();

        let command = envelope.into_command()?;
        let identity = self.identity.verify_bearer(bearer)?;
        self.authorize(&identity.user_id).await?;

        match command {
            SyncCommand::Discover(discover) => {
                tracing::info!(
                    %run_id,
                    user_id = %identity.user_id,
                    source_id = %discover.source_id,
                    "Starting tab discovery"
                );
                self.discover(discover).await
            }
            SyncCommand::Replace(replace) => {
                tracing::info!(
                    %run_id,
                    user_id = %identity.user_id,
                    scope = %replace.scope,
                    mode = replace.mode.as_str(),
                    "Starting full-replace sync"
                );
                self.replace(run_id, replace).await
            }
        }
    }

    /// Denial blocks the run; a permission-service failure does not.
    /// Only a definite "no" is a forbidden condition.
    async fn authorize(&self, user_id: &str) -> SyncResult<()> {
        match self
            .capabilities
            .has_capability(user_id, SYNC_CAPABILITY)
            .await
        {
            Ok(true) => Ok(()),
            Ok(false) => Err(SyncError::Forbidden(format!(
                "User {} lacks the {} capability",
                user_id, SYNC_CAPABILITY
            ))),
            Err(err) => {
                tracing::warn!(
                    user_id = %user_id,
                    error = %err,
                    "Permission check unavailable, proceeding with sync"
                );
                Ok(())
            }
        }
    }

    async fn discover(&self, command: DiscoverCommand) -> SyncResult<RunOutput> {
        let tabs = retry_source_read(
            "list_tabs",
            self.policy.retry_attempts,
            self.policy.retry_base,
            || self.source.list_tabs(&command.source_id),
        )
        .await?;

        tracing::info!(
            source_id = %command.source_id,
            tabs = tabs.len(),
            "Discovery complete"
        );
        Ok(RunOutput::Sheets(tabs))
    }

    async fn replace(&self, run_id: Uuid, command: ReplaceCommand) -> SyncResult<RunOutput> {
        let scope = &command.scope;
        let _guard = self.locks.try_acquire(scope).ok_or_else(|| {
            SyncError::Conflict(format!("A sync run is already active for {}", scope))
        })?;

        // Cleaning: stale rows are tolerable because the upsert below
        // re-establishes the final state either way.
        match db::delete_scope(&self.pool, scope).await {
            Ok(removed) => {
                tracing::debug!(%run_id, removed, "Cleaned prior observations in scope");
            }
            Err(err) => {
                tracing::warn!(%run_id, error = %err, "Cleanup failed, continuing with sync");
            }
        }

        // Fetching
        let tab_name = command.tab_name.as_deref();
        let rows = retry_source_read(
            "fetch_rows",
            self.policy.retry_attempts,
            self.policy.retry_base,
            || {
                self.source
                    .fetch_rows(&scope.source_id, tab_name, &self.policy.fetch_range)
            },
        )
        .await?;

        // Transforming
        let outcome = transform_rows(
            scope,
            command.tab_name.as_deref().unwrap_or(""),
            command.tab_ref.as_deref().unwrap_or(""),
            &rows,
            self.policy.month_first,
        );
        if outcome.report.has_errors() {
            tracing::warn!(
                %run_id,
                cells_skipped = outcome.report.cells_skipped,
                samples = ?outcome.report.error_samples,
                "Transform skipped some cells"
            );
        }

        // Persisting
        if outcome.observations.is_empty() {
            return Err(SyncError::SourceUnavailable(
                "No valid metrics found in sheet data".to_string(),
            ));
        }
        let processed = db::bulk_upsert(&self.pool, &outcome.observations).await?;

        tracing::info!(
            %run_id,
            scope = %scope,
            processed,
            rows_seen = outcome.report.rows_seen,
            rows_dropped = outcome.report.rows_dropped,
            "Sync run complete"
        );

        Ok(RunOutput::Synced {
            processed,
            report: outcome.report,
        })
    }
}
