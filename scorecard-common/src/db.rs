//! Database bootstrap for Scorecard services
//!
//! Owns the shared `metric_observations` table: the sheet-sync service
//! writes it, the dashboard services read it. The natural-key unique index
//! is what makes a sync run's bulk upsert idempotent.

use crate::Result;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::path::Path;
use tracing::info;

/// Initialize database connection pool and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Use proper SQLite URI with mode=rwc (read, write, create)
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // Enable foreign keys
    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

    // WAL allows concurrent readers while a sync run writes
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;

    // Wait briefly on writer contention instead of failing immediately
    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    create_metric_observations_table(&pool).await?;

    Ok(pool)
}

/// Create the metric store schema (idempotent)
///
/// The UNIQUE index covers the observation natural key: one value per
/// (owner, client, source, sheet, tab, metric, date). The scope index
/// serves the full-replace delete and dashboard scope queries.
pub async fn create_metric_observations_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS metric_observations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            owner_id TEXT NOT NULL,
            client_id TEXT NOT NULL DEFAULT '',
            source_id TEXT NOT NULL,
            sheet_name TEXT NOT NULL,
            tab_name TEXT NOT NULL DEFAULT '',
            tab_ref TEXT,
            source_kind TEXT NOT NULL,
            metric_name TEXT NOT NULL,
            category TEXT NOT NULL,
            metric_kind TEXT NOT NULL,
            value REAL NOT NULL,
            observed_on TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_metric_observations_natural_key
        ON metric_observations (
            owner_id, client_id, source_id, sheet_name,
            tab_name, metric_name, observed_on
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_metric_observations_scope
        ON metric_observations (owner_id, client_id, source_id, sheet_name)
        "#,
    )
    .execute(pool)
    .await?;

    info!("Database tables initialized (metric_observations)");

    Ok(())
}
