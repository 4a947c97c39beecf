//! Anonymized CV scorer — the core of the pipeline.
//!
//! One call = one candidate. The prompt carries the full CV text (no
//! truncation) and refers to the subject only as "Candidate #N"; the file
//! name and extracted profile never reach the LLM. The scorer is infallible
//! by contract: every failure mode degrades to a result rather than an error,
//! so one candidate can never abort a batch.

use std::sync::Arc;

use tracing::{error, warn};

use crate::llm_client::prompts::{SCORING_PROMPT_TEMPLATE, SCORING_SYSTEM};
use crate::llm_client::{LlmBackend, LlmError};
use crate::retry::{retry_with_backoff, RetryPolicy};
use crate::screening::json_extract::extract_json_object;
use crate::screening::models::CandidateAnalysis;
use crate::screening::rubric::{RubricScore, WeightedResult, Weights};

pub struct CvScorer {
    llm: Arc<dyn LlmBackend>,
    weights: Weights,
    retry: RetryPolicy,
}

impl CvScorer {
    pub fn new(llm: Arc<dyn LlmBackend>, weights: Weights, retry: RetryPolicy) -> Self {
        Self { llm, weights, retry }
    }

    /// Scores one CV against the job description.
    ///
    /// Rate-limit failures are retried with backoff; terminal failures produce
    /// an ERROR-tier result; unparseable responses produce a flagged
    /// CONSIDER-tier default. Never returns an error.
    pub async fn score(
        &self,
        job_description: &str,
        cv_text: &str,
        candidate_number: u32,
    ) -> CandidateAnalysis {
        let prompt = build_scoring_prompt(job_description, cv_text, candidate_number);

        let outcome = retry_with_backoff(self.retry, LlmError::is_rate_limit, || {
            self.llm.invoke(&prompt, SCORING_SYSTEM)
        })
        .await;

        match outcome {
            Ok(raw) => self.parse_analysis(raw, candidate_number),
            Err(e) => {
                error!("Scoring failed for candidate #{candidate_number}: {e}");
                error_analysis(&e.to_string())
            }
        }
    }

    /// Parses the raw response into a rubric and computes the composite.
    /// A response with no usable JSON degrades to the flagged default rubric.
    fn parse_analysis(&self, raw: String, candidate_number: u32) -> CandidateAnalysis {
        let rubric = match extract_json_object(&raw) {
            Some(json) => match serde_json::from_str::<RubricScore>(json) {
                Ok(rubric) => rubric,
                Err(e) => {
                    warn!("Malformed rubric JSON for candidate #{candidate_number}: {e}");
                    unparseable_rubric(format!("Parse error: {e}"))
                }
            },
            None => {
                warn!("No JSON object in response for candidate #{candidate_number}");
                unparseable_rubric("Analysis format error".to_string())
            }
        };

        let result = WeightedResult::compute(&rubric, &self.weights);
        CandidateAnalysis {
            rubric,
            result,
            raw_response: Some(raw),
        }
    }
}

/// Fills the scoring template. The candidate number goes in first so that
/// placeholder text inside the JD or CV cannot be re-substituted.
fn build_scoring_prompt(job_description: &str, cv_text: &str, candidate_number: u32) -> String {
    SCORING_PROMPT_TEMPLATE
        .replace("{candidate_number}", &candidate_number.to_string())
        .replace("{job_description}", job_description)
        .replace("{cv_content}", cv_text)
}

/// Default rubric for an unparseable response: mid-scale sub-scores (total
/// 50.0 → CONSIDER) with an explicit marker so reviewers know to re-run.
fn unparseable_rubric(detail: String) -> RubricScore {
    RubricScore {
        strengths: vec!["Unable to parse analysis".to_string()],
        weaknesses: vec![detail],
        summary: "Unparseable LLM response".to_string(),
        ..RubricScore::default()
    }
}

/// ERROR-tier analysis for a terminal LLM failure.
fn error_analysis(detail: &str) -> CandidateAnalysis {
    CandidateAnalysis {
        rubric: RubricScore {
            weaknesses: vec![format!("Analysis error: {detail}")],
            summary: "Error during analysis".to_string(),
            ..RubricScore::default()
        },
        result: WeightedResult::error(),
        raw_response: None,
    }
}
