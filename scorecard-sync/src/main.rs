//! scorecard-sync - Sheet Sync Microservice
//!
//! Pulls tabular business data out of Google Sheets, normalizes it into
//! typed metric observations, and full-replace syncs them into the
//! Scorecard metric store under an authenticated, permission-gated
//! request.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scorecard_common::config::{Overrides, SyncSettings};
use scorecard_sync::auth::{HttpCapabilityChecker, IdentityVerifier};
use scorecard_sync::sheets::{SheetsClient, TokenExchanger};
use scorecard_sync::sync::{SyncOrchestrator, SyncPolicy};
use scorecard_sync::AppState;

/// Command-line arguments for scorecard-sync
#[derive(Parser, Debug)]
#[command(name = "scorecard-sync")]
#[command(about = "Sheet sync microservice for Scorecard")]
#[command(version)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long, env = "SCORECARD_CONFIG")]
    config: Option<PathBuf>,

    /// Folder holding the metric store database
    #[arg(short, long, env = "SCORECARD_DATA_FOLDER")]
    data_folder: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "SCORECARD_BIND_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scorecard_sync=debug,scorecard_common=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    info!("Starting scorecard-sync (Sheet Sync) microservice");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let settings = SyncSettings::resolve(Overrides {
        config_path: args.config,
        data_folder: args.data_folder,
        bind_port: args.port,
    })
    .context("Failed to resolve configuration")?;

    let db_path = settings.database_path();
    info!("Database: {}", db_path.display());
    let pool = scorecard_common::db::init_database(&db_path)
        .await
        .context("Failed to initialize metric store")?;

    let token = TokenExchanger::new(
        settings.service_account_path.clone(),
        settings.token_url.clone(),
    );
    let source = Arc::new(SheetsClient::new(settings.sheets_api_base.clone(), token));
    let capabilities = Arc::new(HttpCapabilityChecker::new(
        settings.permission_service_url.clone(),
    ));
    let identity = IdentityVerifier::from_secret(settings.caller_jwt_secret.as_bytes());

    let orchestrator = Arc::new(SyncOrchestrator::new(
        pool,
        source,
        capabilities,
        identity,
        SyncPolicy {
            fetch_range: settings.fetch_range.clone(),
            month_first: settings.month_first,
            retry_attempts: settings.fetch_retry_attempts,
            retry_base: Duration::from_millis(settings.fetch_retry_base_ms),
        },
    ));

    let state = AppState::new(orchestrator);
    let app = scorecard_sync::build_router(state);

    let addr = settings.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
