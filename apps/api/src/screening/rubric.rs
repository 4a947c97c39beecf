//! Rubric scoring model — the five-criterion schema the LLM fills in, the
//! fixed weight table, and the deterministic weighted composite.
//!
//! Everything here is a pure function of its inputs. No LLM call, no
//! randomness: given the same `RubricScore` and `Weights`, the same
//! `WeightedResult` comes out.

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Default raw sub-score when the LLM omits a field. Mid-scale, so a sparse
/// response lands in CONSIDER rather than REJECT.
const DEFAULT_SUB_SCORE: f64 = 50.0;

fn default_sub_score() -> f64 {
    DEFAULT_SUB_SCORE
}

/// The raw rubric as returned by the LLM: five 0–100 sub-scores with
/// free-text justifications, plus qualitative lists and a summary.
///
/// Missing fields deserialize to defaults so a partial response still
/// produces a usable score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RubricScore {
    #[serde(default = "default_sub_score")]
    pub experience_score: f64,
    #[serde(default)]
    pub experience_reason: String,
    #[serde(default = "default_sub_score")]
    pub impact_score: f64,
    #[serde(default)]
    pub impact_reason: String,
    #[serde(default = "default_sub_score")]
    pub skills_score: f64,
    #[serde(default)]
    pub skills_reason: String,
    #[serde(default = "default_sub_score")]
    pub education_score: f64,
    #[serde(default)]
    pub education_reason: String,
    #[serde(default = "default_sub_score")]
    pub certs_extras_score: f64,
    #[serde(default)]
    pub certs_extras_reason: String,
    #[serde(default)]
    pub red_flags: Vec<String>,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub summary: String,
}

impl Default for RubricScore {
    fn default() -> Self {
        serde_json::from_str("{}").expect("empty object deserializes via field defaults")
    }
}

/// Fractional weights per criterion. Must sum to 1.0 (validated at startup).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Weights {
    pub experience: f64,
    pub impact: f64,
    pub skills: f64,
    pub education: f64,
    pub certs_extras: f64,
}

/// Tolerance for the sum-to-one invariant.
const WEIGHT_EPSILON: f64 = 1e-6;

impl Default for Weights {
    fn default() -> Self {
        Self {
            experience: 0.30,
            impact: 0.20,
            skills: 0.20,
            education: 0.20,
            certs_extras: 0.10,
        }
    }
}

impl Weights {
    /// Fails loudly when the weight table is inconsistent. Called once at
    /// startup; a bad table is fatal to the whole run, never per-candidate.
    pub fn validate(&self) -> Result<(), AppError> {
        let entries = [
            ("experience", self.experience),
            ("impact", self.impact),
            ("skills", self.skills),
            ("education", self.education),
            ("certs_extras", self.certs_extras),
        ];

        for (name, w) in entries {
            if !(0.0..=1.0).contains(&w) {
                return Err(AppError::Validation(format!(
                    "weight '{name}' must be in [0, 1], got {w}"
                )));
            }
        }

        let sum: f64 = entries.iter().map(|(_, w)| w).sum();
        if (sum - 1.0).abs() > WEIGHT_EPSILON {
            return Err(AppError::Validation(format!(
                "scoring weights must sum to 1.0, got {sum}"
            )));
        }

        Ok(())
    }
}

/// Recommendation tier. A pure step function of the total score; ERROR is
/// reserved for candidates whose LLM call failed terminally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Recommendation {
    #[serde(rename = "STRONGLY RECOMMEND")]
    StronglyRecommend,
    #[serde(rename = "RECOMMEND")]
    Recommend,
    #[serde(rename = "CONSIDER")]
    Consider,
    #[serde(rename = "REJECT")]
    Reject,
    #[serde(rename = "ERROR")]
    Error,
}

impl Recommendation {
    /// Tier boundaries are inclusive on the lower bound.
    pub fn from_total(total: f64) -> Self {
        if total >= 80.0 {
            Recommendation::StronglyRecommend
        } else if total >= 60.0 {
            Recommendation::Recommend
        } else if total >= 40.0 {
            Recommendation::Consider
        } else {
            Recommendation::Reject
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::StronglyRecommend => "STRONGLY RECOMMEND",
            Recommendation::Recommend => "RECOMMEND",
            Recommendation::Consider => "CONSIDER",
            Recommendation::Reject => "REJECT",
            Recommendation::Error => "ERROR",
        }
    }
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Weighted contribution of one criterion: the clamped raw score and
/// `raw × weight`, rounded to one decimal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Contribution {
    pub raw: f64,
    pub weighted: f64,
}

/// The deterministic weighted composite derived from a `RubricScore`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightedResult {
    pub experience: Contribution,
    pub impact: Contribution,
    pub skills: Contribution,
    pub education: Contribution,
    pub certs_extras: Contribution,
    /// Total score in [0, 100], rounded to one decimal.
    pub total: f64,
    pub recommendation: Recommendation,
}

impl WeightedResult {
    /// Clamps each sub-score to [0, 100], applies the weight table, and maps
    /// the total to a recommendation tier.
    ///
    /// Out-of-range values from the LLM are silently clipped, not rejected.
    pub fn compute(rubric: &RubricScore, weights: &Weights) -> Self {
        let experience = contribution(rubric.experience_score, weights.experience);
        let impact = contribution(rubric.impact_score, weights.impact);
        let skills = contribution(rubric.skills_score, weights.skills);
        let education = contribution(rubric.education_score, weights.education);
        let certs_extras = contribution(rubric.certs_extras_score, weights.certs_extras);

        let total = round1(
            clamp_score(rubric.experience_score) * weights.experience
                + clamp_score(rubric.impact_score) * weights.impact
                + clamp_score(rubric.skills_score) * weights.skills
                + clamp_score(rubric.education_score) * weights.education
                + clamp_score(rubric.certs_extras_score) * weights.certs_extras,
        );

        WeightedResult {
            experience,
            impact,
            skills,
            education,
            certs_extras,
            total,
            recommendation: Recommendation::from_total(total),
        }
    }

    /// ERROR-tier result for a candidate whose LLM call failed terminally.
    /// Score 0 so the candidate ranks last without being dropped.
    pub fn error() -> Self {
        let zero = Contribution { raw: 0.0, weighted: 0.0 };
        WeightedResult {
            experience: zero,
            impact: zero,
            skills: zero,
            education: zero,
            certs_extras: zero,
            total: 0.0,
            recommendation: Recommendation::Error,
        }
    }
}

fn clamp_score(raw: f64) -> f64 {
    if raw.is_finite() {
        raw.clamp(0.0, 100.0)
    } else {
        DEFAULT_SUB_SCORE
    }
}

fn contribution(raw: f64, weight: f64) -> Contribution {
    let clamped = clamp_score(raw);
    Contribution {
        raw: round1(clamped),
        weighted: round1(clamped * weight),
    }
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}
