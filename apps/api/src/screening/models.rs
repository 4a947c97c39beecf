//! Data model for one screening run.
//!
//! A run's candidate set is fixed before scoring starts: submissions are
//! numbered 1..N by upload order, and the number is the ONLY identity the
//! scoring prompt ever sees.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::screening::profile::Profile;
use crate::screening::rubric::{Recommendation, RubricScore, WeightedResult};

/// One uploaded CV, ready for scoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateSubmission {
    /// 1..N by upload order within the run. The anonymized identity.
    pub candidate_number: u32,
    /// Never injected into the scoring prompt.
    pub file_name: String,
    pub raw_text: String,
    /// Structured profile from the extraction stage, when available.
    pub profile: Option<Profile>,
    /// Store handle assigned when the CV row is persisted.
    pub cv_id: Option<Uuid>,
}

/// Scoring outcome for one candidate: the rubric the LLM filled in plus the
/// deterministic weighted composite. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateAnalysis {
    pub rubric: RubricScore,
    pub result: WeightedResult,
    /// Raw LLM response text, kept for auditing. None when the call failed.
    pub raw_response: Option<String>,
}

impl CandidateAnalysis {
    pub fn recommendation(&self) -> Recommendation {
        self.result.recommendation
    }
}

/// A scored candidate in final ranking order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedCandidate {
    pub submission: CandidateSubmission,
    pub analysis: CandidateAnalysis,
}

impl RankedCandidate {
    pub fn total_score(&self) -> f64 {
        self.analysis.result.total
    }

    pub fn candidate_number(&self) -> u32 {
        self.submission.candidate_number
    }
}

/// Aggregate statistics over a completed run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreeningSummary {
    pub total: usize,
    pub mean_score: f64,
    pub strongly_recommend: usize,
    pub recommend: usize,
    pub consider: usize,
    pub reject: usize,
    pub error: usize,
}
