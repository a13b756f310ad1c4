//! Metric observation store operations
//!
//! The two writes the sync protocol needs: scope-wide delete for the
//! cleanup phase and a natural-key bulk upsert for the persist phase.
//! Both are safe to re-run; the unique index on the natural key makes a
//! repeated upsert converge instead of duplicating.

use chrono::NaiveDate;
use sqlx::{Row, SqlitePool};
use scorecard_common::Result;

use crate::models::{MetricCategory, MetricKind, MetricObservation, SyncScope};

/// Delete every observation in the scope. Returns rows removed.
pub async fn delete_scope(pool: &SqlitePool, scope: &SyncScope) -> Result<u64> {
    let result = sqlx::query(
        r#"
        DELETE FROM metric_observations
        WHERE owner_id = ? AND client_id = ? AND source_id = ? AND sheet_name = ?
        "#,
    )
    .bind(&scope.owner_id)
    .bind(&scope.client_id)
    .bind(&scope.source_id)
    .bind(&scope.sheet_name)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Upsert a batch of observations in one transaction.
///
/// Conflicts on the natural key update the derived fields in place, so
/// replaying a batch (or racing the cleanup step) still converges on the
/// latest computed values. Returns the number of observations written.
pub async fn bulk_upsert(pool: &SqlitePool, observations: &[MetricObservation]) -> Result<usize> {
    let mut tx = pool.begin().await?;

    for obs in observations {
        sqlx::query(
            r#"
            INSERT INTO metric_observations (
                owner_id, client_id, source_id, sheet_name, tab_name, tab_ref,
                source_kind, metric_name, category, metric_kind, value,
                observed_on, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(owner_id, client_id, source_id, sheet_name, tab_name, metric_name, observed_on)
            DO UPDATE SET
                tab_ref = excluded.tab_ref,
                source_kind = excluded.source_kind,
                category = excluded.category,
                metric_kind = excluded.metric_kind,
                value = excluded.value,
                created_at = excluded.created_at
            "#,
        )
        .bind(&obs.owner_id)
        .bind(&obs.client_id)
        .bind(&obs.source_id)
        .bind(&obs.sheet_name)
        .bind(&obs.tab_name)
        .bind(&obs.tab_ref)
        .bind(&obs.source_kind)
        .bind(&obs.metric_name)
        .bind(obs.category.as_str())
        .bind(obs.metric_kind.as_str())
        .bind(obs.value)
        .bind(obs.observed_on.to_string())
        .bind(obs.created_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(observations.len())
}

/// Count observations currently stored for the scope.
pub async fn count_scope(pool: &SqlitePool, scope: &SyncScope) -> Result<i64> {
    let count: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM metric_observations
        WHERE owner_id = ? AND client_id = ? AND source_id = ? AND sheet_name = ?
        "#,
    )
    .bind(&scope.owner_id)
    .bind(&scope.client_id)
    .bind(&scope.source_id)
    .bind(&scope.sheet_name)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Load the scope's observations ordered by metric then date.
pub async fn fetch_scope(
    pool: &SqlitePool,
    scope: &SyncScope,
) -> Result<Vec<MetricObservation>> {
    let rows = sqlx::query(
        r#"
        SELECT owner_id, client_id, source_id, sheet_name, tab_name, tab_ref,
               source_kind, metric_name, category, metric_kind, value,
               observed_on, created_at
        FROM metric_observations
        WHERE owner_id = ? AND client_id = ? AND source_id = ? AND sheet_name = ?
        ORDER BY metric_name, observed_on
        "#,
    )
    .bind(&scope.owner_id)
    .bind(&scope.client_id)
    .bind(&scope.source_id)
    .bind(&scope.sheet_name)
    .fetch_all(pool)
    .await?;

    let mut observations = Vec::with_capacity(rows.len());
    for row in rows {
        let category_str: String = row.get("category");
        let category = MetricCategory::parse(&category_str).ok_or_else(|| {
            scorecard_common::Error::Internal(format!("Unknown stored category: {}", category_str))
        })?;

        let kind_str: String = row.get("metric_kind");
        let metric_kind = MetricKind::parse(&kind_str).ok_or_else(|| {
            scorecard_common::Error::Internal(format!("Unknown stored metric kind: {}", kind_str))
        })?;

        let observed_on_str: String = row.get("observed_on");
        let observed_on: NaiveDate = observed_on_str.parse().map_err(|e| {
            scorecard_common::Error::Internal(format!(
                "Failed to parse observed_on '{}': {}",
                observed_on_str, e
            ))
        })?;

        let created_at_str: String = row.get("created_at");
        let created_at = chrono::DateTime::parse_from_rfc3339(&created_at_str)
            .map_err(|e| {
                scorecard_common::Error::Internal(format!("Failed to parse created_at: {}", e))
            })?
            .with_timezone(&chrono::Utc);

        observations.push(MetricObservation {
            owner_id: row.get("owner_id"),
            client_id: row.get("client_id"),
            source_id: row.get("source_id"),
            sheet_name: row.get("sheet_name"),
            tab_name: row.get("tab_name"),
            tab_ref: row.get::<Option<String>, _>("tab_ref").unwrap_or_default(),
            source_kind: row.get("source_kind"),
            metric_name: row.get("metric_name"),
            category,
            metric_kind,
            value: row.get("value"),
            observed_on,
            created_at,
        });
    }

    Ok(observations)
}
