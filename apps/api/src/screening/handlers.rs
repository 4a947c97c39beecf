//! Axum route handlers for the screening API.

use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::extractor::extract_text;
use crate::screening::models::{CandidateSubmission, RankedCandidate, ScreeningSummary};
use crate::screening::profile::{extract_profile, Profile};
use crate::screening::rubric::{Recommendation, RubricScore};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

/// One candidate in the response, without echoing the full CV text back.
#[derive(Debug, Serialize, Deserialize)]
pub struct CandidateResult {
    pub candidate_number: u32,
    pub file_name: String,
    pub profile: Option<Profile>,
    pub total_score: f64,
    pub recommendation: Recommendation,
    pub rubric: RubricScore,
}

impl From<&RankedCandidate> for CandidateResult {
    fn from(c: &RankedCandidate) -> Self {
        CandidateResult {
            candidate_number: c.submission.candidate_number,
            file_name: c.submission.file_name.clone(),
            profile: c.submission.profile.clone(),
            total_score: c.analysis.result.total,
            recommendation: c.analysis.result.recommendation,
            rubric: c.analysis.rubric.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ScreeningResponse {
    pub job_id: Uuid,
    pub summary: ScreeningSummary,
    pub ranked: Vec<CandidateResult>,
    /// Files that failed text extraction, with the reason. The rest of the
    /// batch proceeds without them.
    pub skipped_files: Vec<SkippedFile>,
}

#[derive(Debug, Serialize)]
pub struct SkippedFile {
    pub file_name: String,
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct ResultsResponse {
    pub job_id: Uuid,
    pub analyses: Vec<crate::store::AnalysisRow>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/screenings
///
/// Multipart upload: `job_title`, `job_description`, and one or more CV files
/// (PDF or TXT). Runs the full pipeline — extract, profile, anonymized
/// concurrent scoring, ranking — persists everything, and returns the ranked
/// shortlist with summary statistics.
pub async fn handle_run_screening(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ScreeningResponse>, AppError> {
    let mut job_title = String::new();
    let mut job_description = String::new();
    let mut files: Vec<(String, Vec<u8>)> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart payload: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "job_title" => {
                job_title = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(e.to_string()))?;
            }
            "job_description" => {
                job_description = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(e.to_string()))?;
            }
            _ => {
                let file_name = field.file_name().unwrap_or("unnamed").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(e.to_string()))?;
                files.push((file_name, bytes.to_vec()));
            }
        }
    }

    if job_description.trim().is_empty() {
        return Err(AppError::Validation(
            "job_description cannot be empty".to_string(),
        ));
    }
    if files.is_empty() {
        return Err(AppError::Validation(
            "at least one CV file is required".to_string(),
        ));
    }

    let job_id = state.store.create_job(&job_title, &job_description).await?;

    // Extraction failures are isolated per file; the rest proceed
    let mut skipped_files = Vec::new();
    let mut submissions = Vec::new();

    for (file_name, bytes) in &files {
        let raw_text = match extract_text(file_name, bytes) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("Skipping {file_name}: {e}");
                skipped_files.push(SkippedFile {
                    file_name: file_name.clone(),
                    reason: e.to_string(),
                });
                continue;
            }
        };

        let profile = extract_profile(&raw_text, &state.llm, Default::default()).await;
        let parsed_info = serde_json::to_value(&profile).ok();
        let cv_id = state
            .store
            .save_cv(job_id, file_name, &raw_text, parsed_info.as_ref())
            .await?;

        // Candidate numbers follow upload order within the run
        submissions.push(CandidateSubmission {
            candidate_number: submissions.len() as u32 + 1,
            file_name: file_name.clone(),
            raw_text,
            profile: Some(profile),
            cv_id: Some(cv_id),
        });
    }

    if submissions.is_empty() {
        return Err(AppError::Extraction(
            "no CV could be extracted from the uploaded files".to_string(),
        ));
    }

    let outcome = state.screener.run(&job_description, submissions).await?;

    for candidate in &outcome.ranked {
        if let Some(cv_id) = candidate.submission.cv_id {
            let reasons = serde_json::to_value(&candidate.analysis.rubric)
                .map_err(|e| AppError::Internal(e.into()))?;
            state
                .store
                .save_analysis(
                    cv_id,
                    candidate.total_score(),
                    candidate.analysis.raw_response.as_deref().unwrap_or(""),
                    &reasons,
                    candidate.candidate_number(),
                )
                .await?;
        }
    }

    Ok(Json(ScreeningResponse {
        job_id,
        summary: outcome.summary,
        ranked: outcome.ranked.iter().map(CandidateResult::from).collect(),
        skipped_files,
    }))
}

/// GET /api/v1/screenings/:job_id/results
///
/// Persisted analyses for a job, ordered by score descending.
pub async fn handle_get_results(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<ResultsResponse>, AppError> {
    let analyses = state.store.analyses_for_job(job_id).await?;
    Ok(Json(ResultsResponse { job_id, analyses }))
}

/// GET /api/v1/cvs/:cv_id/profile
///
/// Structured profile extracted at upload time for one CV.
pub async fn handle_get_profile(
    State(state): State<AppState>,
    Path(cv_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let parsed = state.store.parsed_info(cv_id).await?.ok_or_else(|| {
        AppError::NotFound(format!("no parsed profile stored for CV {cv_id}"))
    })?;
    Ok(Json(parsed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::{LlmBackend, LlmError};
    use crate::retry::RetryPolicy;
    use crate::routes::build_router;
    use crate::screening::batch::BatchScreener;
    use crate::screening::rubric::Weights;
    use crate::screening::scorer::CvScorer;
    use crate::store::{AnalysisRow, AnalysisStore};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::Utc;
    use serde_json::Value;
    use std::sync::{Arc, Mutex};
    use tower::ServiceExt;

    /// In-memory store standing in for Postgres.
    #[derive(Default)]
    struct MemoryStore {
        cvs: Mutex<Vec<(Uuid, String)>>,
        analyses: Mutex<Vec<AnalysisRow>>,
    }

    #[async_trait]
    impl AnalysisStore for MemoryStore {
        async fn create_job(&self, _title: &str, _description: &str) -> Result<Uuid, AppError> {
            Ok(Uuid::new_v4())
        }

        async fn save_cv(
            &self,
            _job_id: Uuid,
            file_name: &str,
            _content: &str,
            _parsed_info: Option<&Value>,
        ) -> Result<Uuid, AppError> {
            let id = Uuid::new_v4();
            self.cvs.lock().unwrap().push((id, file_name.to_string()));
            Ok(id)
        }

        async fn save_analysis(
            &self,
            cv_id: Uuid,
            score: f64,
            raw_analysis: &str,
            structured_reasons: &Value,
            candidate_number: u32,
        ) -> Result<Uuid, AppError> {
            let id = Uuid::new_v4();
            let file_name = self
                .cvs
                .lock()
                .unwrap()
                .iter()
                .find(|(id, _)| *id == cv_id)
                .map(|(_, name)| name.clone())
                .unwrap_or_default();
            self.analyses.lock().unwrap().push(AnalysisRow {
                id,
                cv_id,
                file_name,
                candidate_number: candidate_number as i32,
                score,
                raw_analysis: raw_analysis.to_string(),
                structured_reasons: structured_reasons.clone(),
                created_at: Utc::now(),
            });
            Ok(id)
        }

        async fn analyses_for_job(&self, _job_id: Uuid) -> Result<Vec<AnalysisRow>, AppError> {
            let mut rows = self.analyses.lock().unwrap().clone();
            rows.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());
            Ok(rows)
        }

        async fn parsed_info(&self, _cv_id: Uuid) -> Result<Option<Value>, AppError> {
            Ok(Some(serde_json::json!({"name": "Jane Doe"})))
        }
    }

    /// Answers profile-extraction prompts with a fixed profile and scoring
    /// prompts with scores derived from a marker in the CV text.
    struct PipelineLlm;

    #[async_trait]
    impl LlmBackend for PipelineLlm {
        async fn invoke(&self, prompt: &str, _system: &str) -> Result<String, LlmError> {
            if prompt.contains("expert CV parser") {
                return Ok(r#"{"name": "Jane Doe", "email": "jane@x.io"}"#.to_string());
            }
            let score = if prompt.contains("strong-candidate") { 85 } else { 45 };
            Ok(format!(
                r#"{{"experience_score": {score}, "impact_score": {score}, "skills_score": {score}, "education_score": {score}, "certs_extras_score": {score}}}"#
            ))
        }
    }

    fn test_app(store: Arc<MemoryStore>) -> axum::Router {
        let llm: Arc<dyn LlmBackend> = Arc::new(PipelineLlm);
        let scorer = Arc::new(CvScorer::new(
            llm.clone(),
            Weights::default(),
            RetryPolicy::default(),
        ));
        build_router(AppState {
            store,
            llm,
            screener: Arc::new(BatchScreener::new(scorer)),
        })
    }

    const BOUNDARY: &str = "test-boundary";

    fn text_part(name: &str, value: &str) -> String {
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        )
    }

    fn file_part(file_name: &str, content: &str) -> String {
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"cv\"; filename=\"{file_name}\"\r\n\
             Content-Type: text/plain\r\n\r\n{content}\r\n"
        )
    }

    fn multipart_request(parts: &[String]) -> Request<Body> {
        let body = format!("{}--{BOUNDARY}--\r\n", parts.concat());
        Request::builder()
            .method("POST")
            .uri("/api/v1/screenings")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_screening_endpoint_ranks_and_persists() {
        let store = Arc::new(MemoryStore::default());
        let app = test_app(store.clone());

        let request = multipart_request(&[
            text_part("job_title", "Senior Rust Engineer"),
            text_part("job_description", "5+ years Rust required"),
            file_part("alice.txt", "Alice Example\nstrong-candidate\n"),
            file_part("bob.txt", "Bob Example\naverage background\n"),
        ]);

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        let ranked = body["ranked"].as_array().unwrap();
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0]["file_name"], "alice.txt");
        assert_eq!(ranked[0]["total_score"], 85.0);
        assert_eq!(ranked[0]["recommendation"], "STRONGLY RECOMMEND");
        assert_eq!(ranked[1]["recommendation"], "CONSIDER");
        assert_eq!(body["summary"]["total"], 2);

        assert_eq!(store.analyses.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_screening_without_files_is_bad_request() {
        let app = test_app(Arc::new(MemoryStore::default()));
        let request = multipart_request(&[
            text_part("job_title", "Role"),
            text_part("job_description", "requirements"),
        ]);

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_screening_with_empty_job_description_is_bad_request() {
        let app = test_app(Arc::new(MemoryStore::default()));
        let request = multipart_request(&[
            text_part("job_title", "Role"),
            text_part("job_description", "   "),
            file_part("cv.txt", "Jane Doe\n"),
        ]);

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unextractable_file_is_skipped_not_fatal() {
        let store = Arc::new(MemoryStore::default());
        let app = test_app(store.clone());

        let request = multipart_request(&[
            text_part("job_title", "Role"),
            text_part("job_description", "requirements"),
            file_part("cv.docx", "binary-ish"),
            file_part("cv.txt", "Jane Doe\nstrong-candidate\n"),
        ]);

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["ranked"].as_array().unwrap().len(), 1);
        let skipped = body["skipped_files"].as_array().unwrap();
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0]["file_name"], "cv.docx");
    }

    #[tokio::test]
    async fn test_profile_endpoint_returns_parsed_info() {
        let app = test_app(Arc::new(MemoryStore::default()));
        let request = Request::builder()
            .uri(format!("/api/v1/cvs/{}/profile", Uuid::new_v4()))
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["name"], "Jane Doe");
    }
}
