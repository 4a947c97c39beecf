//! Batch orchestrator — fans scoring out across all submissions, collects
//! results, and ranks them.
//!
//! Each scoring task is independent: it reads the shared job description and
//! LLM handle, produces its own result, and shares no mutable state with
//! siblings. The orchestrator drains a bounded completion stream and sorts
//! its own local list, so no lock is needed anywhere.

use std::cmp::Ordering;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::info;

use crate::errors::AppError;
use crate::screening::models::{CandidateSubmission, RankedCandidate, ScreeningSummary};
use crate::screening::rubric::Recommendation;
use crate::screening::scorer::CvScorer;

/// Worker cap per batch. Effective pool size is `min(5, candidates)`.
pub const MAX_CONCURRENT_SCORING: usize = 5;

/// The ranked output of one run plus its aggregate statistics.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ScreeningOutcome {
    pub ranked: Vec<RankedCandidate>,
    pub summary: ScreeningSummary,
}

pub struct BatchScreener {
    scorer: Arc<CvScorer>,
}

impl BatchScreener {
    pub fn new(scorer: Arc<CvScorer>) -> Self {
        Self { scorer }
    }

    /// Scores every submission concurrently and returns the ranked list.
    ///
    /// Completion order across candidates is unspecified; the final ordering
    /// is deterministic given the same scores (total descending, ties by
    /// ascending candidate number). A candidate whose scoring failed still
    /// appears, tagged ERROR — one failure never aborts the batch.
    pub async fn run(
        &self,
        job_description: &str,
        submissions: Vec<CandidateSubmission>,
    ) -> Result<ScreeningOutcome, AppError> {
        if submissions.is_empty() {
            return Err(AppError::Validation(
                "screening requires at least one CV".to_string(),
            ));
        }

        let total = submissions.len();
        let workers = MAX_CONCURRENT_SCORING.min(total);
        info!("Scoring {total} candidates with {workers} workers");

        let mut ranked: Vec<RankedCandidate> = stream::iter(submissions)
            .map(|submission| {
                let scorer = self.scorer.clone();
                async move {
                    let analysis = scorer
                        .score(
                            job_description,
                            &submission.raw_text,
                            submission.candidate_number,
                        )
                        .await;
                    RankedCandidate { submission, analysis }
                }
            })
            .buffer_unordered(workers)
            .collect()
            .await;

        rank(&mut ranked);
        let summary = summarize(&ranked);

        info!(
            "Screening complete: {} candidates, mean score {:.1}",
            summary.total, summary.mean_score
        );

        Ok(ScreeningOutcome { ranked, summary })
    }
}

/// Sorts by total score descending; ties keep ascending candidate-number
/// order regardless of completion order.
fn rank(candidates: &mut [RankedCandidate]) {
    candidates.sort_by(|a, b| {
        b.total_score()
            .partial_cmp(&a.total_score())
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.candidate_number().cmp(&b.candidate_number()))
    });
}

pub fn summarize(candidates: &[RankedCandidate]) -> ScreeningSummary {
    let total = candidates.len();
    let mut summary = ScreeningSummary {
        total,
        mean_score: 0.0,
        strongly_recommend: 0,
        recommend: 0,
        consider: 0,
        reject: 0,
        error: 0,
    };

    if total == 0 {
        return summary;
    }

    let mut score_sum = 0.0;
    for candidate in candidates {
        score_sum += candidate.total_score();
        match candidate.analysis.recommendation() {
            Recommendation::StronglyRecommend => summary.strongly_recommend += 1,
            Recommendation::Recommend => summary.recommend += 1,
            Recommendation::Consider => summary.consider += 1,
            Recommendation::Reject => summary.reject += 1,
            Recommendation::Error => summary.error += 1,
        }
    }

    summary.mean_score = (score_sum / total as f64 * 10.0).round() / 10.0;
    summary
}

/// Top-N slice of an already-ranked list.
pub fn top_candidates(ranked: &[RankedCandidate], n: usize) -> &[RankedCandidate] {
    &ranked[..n.min(ranked.len())]
}

/// Candidates in a given recommendation tier, in ranking order.
pub fn candidates_by_tier(
    ranked: &[RankedCandidate],
    tier: Recommendation,
) -> Vec<&RankedCandidate> {
    ranked
        .iter()
        .filter(|c| c.analysis.recommendation() == tier)
        .collect()
}
