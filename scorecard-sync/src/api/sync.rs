//! Sync endpoint
//!
//! One route serves both request variants: a full-replace sync returns
//! counts from the transform report, a discovery request returns the
//! source's tabs verbatim. Failures flow through [`crate::error::SyncError`]
//! and its status mapping.

use axum::{
    extract::rejection::JsonRejection,
    extract::State,
    http::{header, HeaderMap},
    routing::post,
    Json, Router,
};
use serde::Serialize;

use crate::error::{SyncError, SyncResult};
use crate::models::SyncEnvelope;
use crate::sheets::SheetTab;
use crate::sync::RunOutput;
use crate::AppState;

/// Successful full-replace sync.
#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub success: bool,
    pub message: String,
    #[serde(rename = "metricsProcessed")]
    pub metrics_processed: usize,
    #[serde(rename = "rowsSkipped", skip_serializing_if = "Option::is_none")]
    pub rows_skipped: Option<usize>,
    #[serde(rename = "rowErrors", skip_serializing_if = "Option::is_none")]
    pub row_errors: Option<Vec<String>>,
}

/// Successful discovery.
#[derive(Debug, Serialize)]
pub struct DiscoveryResponse {
    pub success: bool,
    pub sheets: Vec<SheetTab>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SyncApiResponse {
    Sync(SyncResponse),
    Discovery(DiscoveryResponse),
}

/// POST /api/sync
pub async fn run_sync(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<SyncEnvelope>, JsonRejection>,
) -> SyncResult<Json<SyncApiResponse>> {
    let Json(envelope) =
        payload.map_err(|e| SyncError::Validation(format!("Invalid request body: {}", e)))?;

    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let output = state.orchestrator.run(bearer, envelope).await?;

    let response = match output {
        RunOutput::Sheets(sheets) => SyncApiResponse::Discovery(DiscoveryResponse {
            success: true,
            sheets,
        }),
        RunOutput::Synced { processed, report } => SyncApiResponse::Sync(SyncResponse {
            success: true,
            message: format!("Successfully synced {} metrics", processed),
            metrics_processed: processed,
            rows_skipped: (report.rows_dropped > 0).then_some(report.rows_dropped),
            row_errors: (!report.error_samples.is_empty()).then(|| report.error_samples.clone()),
        }),
    };

    Ok(Json(response))
}

/// Build sync routes
pub fn sync_routes() -> Router<AppState> {
    Router::new().route("/api/sync", post(run_sync))
}
