//! Persistence collaborator for the screening pipeline.
//!
//! The pipeline depends only on the `AnalysisStore` trait; the Postgres
//! implementation is injected at startup and a fake store substitutes in
//! tests. Schema and migration concerns live outside this crate.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::errors::AppError;

/// One persisted analysis joined with its CV's file name, for result listings.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AnalysisRow {
    pub id: Uuid,
    pub cv_id: Uuid,
    pub file_name: String,
    pub candidate_number: i32,
    pub score: f64,
    pub raw_analysis: String,
    pub structured_reasons: Value,
    pub created_at: DateTime<Utc>,
}

/// Store contract the pipeline needs — nothing more.
#[async_trait]
pub trait AnalysisStore: Send + Sync {
    async fn create_job(&self, title: &str, description: &str) -> Result<Uuid, AppError>;

    async fn save_cv(
        &self,
        job_id: Uuid,
        file_name: &str,
        content: &str,
        parsed_info: Option<&Value>,
    ) -> Result<Uuid, AppError>;

    async fn save_analysis(
        &self,
        cv_id: Uuid,
        score: f64,
        raw_analysis: &str,
        structured_reasons: &Value,
        candidate_number: u32,
    ) -> Result<Uuid, AppError>;

    /// Analyses for a job, ordered by score descending.
    async fn analyses_for_job(&self, job_id: Uuid) -> Result<Vec<AnalysisRow>, AppError>;

    async fn parsed_info(&self, cv_id: Uuid) -> Result<Option<Value>, AppError>;
}

/// Postgres-backed store.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AnalysisStore for PgStore {
    async fn create_job(&self, title: &str, description: &str) -> Result<Uuid, AppError> {
        let id: (Uuid,) = sqlx::query_as(
            "INSERT INTO job_postings (id, title, description, created_at)
             VALUES (gen_random_uuid(), $1, $2, now())
             RETURNING id",
        )
        .bind(title)
        .bind(description)
        .fetch_one(&self.pool)
        .await?;
        Ok(id.0)
    }

    async fn save_cv(
        &self,
        job_id: Uuid,
        file_name: &str,
        content: &str,
        parsed_info: Option<&Value>,
    ) -> Result<Uuid, AppError> {
        let id: (Uuid,) = sqlx::query_as(
            "INSERT INTO cvs (id, job_id, file_name, content, parsed_info, created_at)
             VALUES (gen_random_uuid(), $1, $2, $3, $4, now())
             RETURNING id",
        )
        .bind(job_id)
        .bind(file_name)
        .bind(content)
        .bind(parsed_info)
        .fetch_one(&self.pool)
        .await?;
        Ok(id.0)
    }

    async fn save_analysis(
        &self,
        cv_id: Uuid,
        score: f64,
        raw_analysis: &str,
        structured_reasons: &Value,
        candidate_number: u32,
    ) -> Result<Uuid, AppError> {
        let id: (Uuid,) = sqlx::query_as(
            "INSERT INTO cv_analyses
                 (id, cv_id, score, raw_analysis, structured_reasons, candidate_number, created_at)
             VALUES (gen_random_uuid(), $1, $2, $3, $4, $5, now())
             RETURNING id",
        )
        .bind(cv_id)
        .bind(score)
        .bind(raw_analysis)
        .bind(structured_reasons)
        .bind(candidate_number as i32)
        .fetch_one(&self.pool)
        .await?;
        Ok(id.0)
    }

    async fn analyses_for_job(&self, job_id: Uuid) -> Result<Vec<AnalysisRow>, AppError> {
        let rows = sqlx::query_as::<_, AnalysisRow>(
            "SELECT a.id, a.cv_id, c.file_name, a.candidate_number, a.score,
                    a.raw_analysis, a.structured_reasons, a.created_at
             FROM cv_analyses a
             JOIN cvs c ON c.id = a.cv_id
             WHERE c.job_id = $1
             ORDER BY a.score DESC, a.candidate_number ASC",
        )
        .bind(job_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn parsed_info(&self, cv_id: Uuid) -> Result<Option<Value>, AppError> {
        let row: Option<(Option<Value>,)> =
            sqlx::query_as("SELECT parsed_info FROM cvs WHERE id = $1")
                .bind(cv_id)
                .fetch_optional(&self.pool)
                .await?;
        match row {
            Some((info,)) => Ok(info),
            None => Err(AppError::NotFound(format!("CV {cv_id} not found"))),
        }
    }
}
