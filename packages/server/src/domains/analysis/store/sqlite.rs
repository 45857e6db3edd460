//! SQLite job store.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

use super::{JobStore, StoreError, StoreResult};
use crate::domains::analysis::models::{AnalysisJob, AnalysisResult, JobFailure, JobStatus};

const JOB_COLUMNS: &str = r#"
    job_id, user_id, url, status, retry_count, created_at, finished_at, notes,
    opportunity_analysis, full_text_analysis, exclusion_analysis, detailed_analysis,
    actionable_recommendations, error_message, error_details
"#;

/// SQLite-backed job store.
pub struct SqliteJobStore {
    pool: SqlitePool,
}

impl SqliteJobStore {
    /// Connect and run migrations.
    ///
    /// # Example URLs
    /// - `sqlite::memory:` - In-memory database (use [`Self::in_memory`])
    /// - `sqlite://./analyzer.db` - File-based database, created if missing
    pub async fn new(database_url: &str) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        Self::from_pool(pool).await
    }

    /// Create an in-memory store (for testing).
    ///
    /// Uses a single connection that never expires; every connection to
    /// `:memory:` is a separate database.
    pub async fn in_memory() -> StoreResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        Self::from_pool(pool).await
    }

    /// Wrap an existing pool, running migrations.
    pub async fn from_pool(pool: SqlitePool) -> StoreResult<Self> {
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn ts(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn to_json<T: serde::Serialize>(value: &T) -> StoreResult<String> {
    Ok(serde_json::to_string(value)?)
}

// Row types for sqlx queries
#[derive(Debug, FromRow)]
struct JobRow {
    job_id: String,
    user_id: String,
    url: String,
    status: String,
    retry_count: i32,
    created_at: String,
    finished_at: Option<String>,
    notes: Option<String>,
    opportunity_analysis: Option<String>,
    full_text_analysis: Option<String>,
    exclusion_analysis: String,
    detailed_analysis: String,
    actionable_recommendations: String,
    error_message: Option<String>,
    error_details: Option<String>,
}

impl JobRow {
    fn into_job(self) -> StoreResult<AnalysisJob> {
        let job_id = self.job_id.clone();
        let corrupt = |reason: String| StoreError::Corrupt {
            job_id: job_id.clone(),
            reason,
        };

        let parse_ts = |raw: &str| {
            DateTime::parse_from_rfc3339(raw)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| corrupt(format!("invalid date {raw:?}: {e}")))
        };

        Ok(AnalysisJob {
            job_id: Uuid::parse_str(&self.job_id).map_err(|e| corrupt(e.to_string()))?,
            user_id: self.user_id,
            url: self.url,
            status: JobStatus::from_str(&self.status).map_err(|e| corrupt(e.to_string()))?,
            retry_count: self.retry_count,
            created_at: parse_ts(&self.created_at)?,
            finished_at: self.finished_at.as_deref().map(parse_ts).transpose()?,
            notes: self.notes,
            opportunity_analysis: self
                .opportunity_analysis
                .as_deref()
                .map(serde_json::from_str)
                .transpose()
                .map_err(|e| corrupt(format!("invalid opportunity_analysis: {e}")))?,
            full_text_analysis: self.full_text_analysis,
            exclusion_analysis: serde_json::from_str(&self.exclusion_analysis)
                .map_err(|e| corrupt(format!("invalid exclusion_analysis: {e}")))?,
            detailed_analysis: serde_json::from_str(&self.detailed_analysis)
                .map_err(|e| corrupt(format!("invalid detailed_analysis: {e}")))?,
            actionable_recommendations: serde_json::from_str(&self.actionable_recommendations)
                .map_err(|e| corrupt(format!("invalid actionable_recommendations: {e}")))?,
            error_message: self.error_message,
            error_details: self
                .error_details
                .as_deref()
                .map(serde_json::from_str)
                .transpose()
                .map_err(|e| corrupt(format!("invalid error_details: {e}")))?,
        })
    }
}

#[async_trait]
impl JobStore for SqliteJobStore {
    async fn insert(&self, job: &AnalysisJob) -> StoreResult<()> {
        let opportunity_analysis = job.opportunity_analysis.as_ref().map(to_json).transpose()?;
        let exclusion_analysis = to_json(&job.exclusion_analysis)?;
        let detailed_analysis = to_json(&job.detailed_analysis)?;
        let actionable_recommendations = to_json(&job.actionable_recommendations)?;
        let error_details = job.error_details.as_ref().map(to_json).transpose()?;

        let result = sqlx::query(
            r#"
            INSERT INTO analysis_jobs (
                job_id, user_id, url, status, retry_count, created_at, finished_at, notes,
                opportunity_analysis, full_text_analysis, exclusion_analysis, detailed_analysis,
                actionable_recommendations, error_message, error_details
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(job.job_id.to_string())
        .bind(&job.user_id)
        .bind(&job.url)
        .bind(job.status.as_str())
        .bind(job.retry_count)
        .bind(ts(&job.created_at))
        .bind(job.finished_at.as_ref().map(ts))
        .bind(&job.notes)
        .bind(opportunity_analysis)
        .bind(&job.full_text_analysis)
        .bind(exclusion_analysis)
        .bind(detailed_analysis)
        .bind(actionable_recommendations)
        .bind(&job.error_message)
        .bind(error_details)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(StoreError::Duplicate(job.job_id))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get(&self, job_id: Uuid) -> StoreResult<Option<AnalysisJob>> {
        let row = sqlx::query_as::<_, JobRow>(&format!(
            "SELECT {JOB_COLUMNS} FROM analysis_jobs WHERE job_id = ?"
        ))
        .bind(job_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(JobRow::into_job).transpose()
    }

    async fn list_for_user(&self, user_id: &str) -> StoreResult<Vec<AnalysisJob>> {
        let rows = sqlx::query_as::<_, JobRow>(&format!(
            "SELECT {JOB_COLUMNS} FROM analysis_jobs WHERE user_id = ? ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(JobRow::into_job).collect()
    }

    async fn delete_for_owner(&self, job_id: Uuid, user_id: &str) -> StoreResult<bool> {
        let affected = sqlx::query("DELETE FROM analysis_jobs WHERE job_id = ? AND user_id = ?")
            .bind(job_id.to_string())
            .bind(user_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(affected == 1)
    }

    async fn claim(&self, job_id: Uuid) -> StoreResult<bool> {
        let affected = sqlx::query(
            "UPDATE analysis_jobs SET status = 'in_progress' WHERE job_id = ? AND status = 'pending'",
        )
        .bind(job_id.to_string())
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(affected == 1)
    }

    async fn complete(
        &self,
        job_id: Uuid,
        result: &AnalysisResult,
        finished_at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let opportunity_analysis = to_json(&result.opportunity_analysis)?;
        let exclusion_analysis = to_json(&result.exclusion_analysis)?;
        let detailed_analysis = to_json(&result.detailed_analysis)?;
        let actionable_recommendations = to_json(&result.actionable_recommendations)?;

        let affected = sqlx::query(
            r#"
            UPDATE analysis_jobs
            SET status = 'completed',
                finished_at = ?,
                opportunity_analysis = ?,
                full_text_analysis = ?,
                exclusion_analysis = ?,
                detailed_analysis = ?,
                actionable_recommendations = ?
            WHERE job_id = ? AND status = 'in_progress'
            "#,
        )
        .bind(ts(&finished_at))
        .bind(opportunity_analysis)
        .bind(&result.full_text_analysis)
        .bind(exclusion_analysis)
        .bind(detailed_analysis)
        .bind(actionable_recommendations)
        .bind(job_id.to_string())
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(affected == 1)
    }

    async fn fail(
        &self,
        job_id: Uuid,
        expected: JobStatus,
        failure: &JobFailure,
        finished_at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        if expected.is_terminal() {
            return Ok(false);
        }

        let error_details = to_json(&failure.details)?;

        let affected = sqlx::query(
            r#"
            UPDATE analysis_jobs
            SET status = 'failed',
                finished_at = ?,
                error_message = ?,
                error_details = ?
            WHERE job_id = ? AND status = ?
            "#,
        )
        .bind(ts(&finished_at))
        .bind(&failure.message)
        .bind(error_details)
        .bind(job_id.to_string())
        .bind(expected.as_str())
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(affected == 1)
    }

    async fn record_retry(
        &self,
        job_id: Uuid,
        expected: JobStatus,
        expected_retry_count: i32,
        note: &str,
    ) -> StoreResult<bool> {
        let affected = sqlx::query(
            r#"
            UPDATE analysis_jobs
            SET retry_count = retry_count + 1,
                notes = CASE
                    WHEN notes IS NULL OR notes = '' THEN ?
                    ELSE notes || char(10) || ?
                END
            WHERE job_id = ? AND status = ? AND retry_count = ?
            "#,
        )
        .bind(note)
        .bind(note)
        .bind(job_id.to_string())
        .bind(expected.as_str())
        .bind(expected_retry_count)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(affected == 1)
    }

    async fn find_stale(&self, cutoff: DateTime<Utc>) -> StoreResult<Vec<AnalysisJob>> {
        let rows = sqlx::query_as::<_, JobRow>(&format!(
            r#"
            SELECT {JOB_COLUMNS}
            FROM analysis_jobs
            WHERE status IN ('pending', 'in_progress') AND created_at < ?
            ORDER BY created_at ASC
            "#
        ))
        .bind(ts(&cutoff))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(JobRow::into_job).collect()
    }

    async fn delete_failed_before(&self, cutoff: DateTime<Utc>) -> StoreResult<u64> {
        let affected =
            sqlx::query("DELETE FROM analysis_jobs WHERE status = 'failed' AND finished_at < ?")
                .bind(ts(&cutoff))
                .execute(&self.pool)
                .await?
                .rows_affected();

        Ok(affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn unserializable_values_are_errors() {
        let value: HashMap<(u8, u8), u8> = HashMap::from([((1, 2), 3)]);
        assert!(matches!(to_json(&value), Err(StoreError::Serialization(_))));
    }
}
