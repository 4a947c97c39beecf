//! Structured extraction stage — turns raw CV text into a candidate profile.
//!
//! Primary path is LLM extraction into the `Profile` schema. On any failure
//! (LLM error, missing or malformed JSON) it degrades to deterministic
//! pattern extraction. This stage never errors outward: quality degrades,
//! availability does not.

use std::sync::{Arc, OnceLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::llm_client::prompts::{CV_PARSE_PROMPT_TEMPLATE, CV_PARSE_SYSTEM};
use crate::llm_client::{LlmBackend, LlmError};
use crate::retry::{retry_with_backoff, RetryPolicy};
use crate::screening::json_extract::extract_json_object;

pub const NOT_FOUND: &str = "Not found";
pub const UNKNOWN_CANDIDATE: &str = "Unknown Candidate";

/// Header lines that must never be mistaken for a candidate name.
const NAME_STOPLIST: [&str; 5] = [
    "CURRICULUM VITAE",
    "CV",
    "RESUME",
    "CONTACT",
    "PERSONAL INFORMATION",
];

fn not_found() -> String {
    NOT_FOUND.to_string()
}

fn unknown_candidate() -> String {
    UNKNOWN_CANDIDATE.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EducationEntry {
    #[serde(default)]
    pub degree: String,
    #[serde(default)]
    pub institution: String,
    #[serde(default)]
    pub year: String,
    #[serde(default)]
    pub details: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperienceEntry {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub responsibilities: String,
}

/// Structured candidate profile. Used for display and persistence only —
/// never injected into the anonymized scoring prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default = "unknown_candidate")]
    pub name: String,
    #[serde(default = "not_found")]
    pub email: String,
    #[serde(default = "not_found")]
    pub phone: String,
    #[serde(default = "not_found")]
    pub location: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub education: Vec<EducationEntry>,
    #[serde(default)]
    pub experience: Vec<ExperienceEntry>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub certifications: Vec<String>,
    #[serde(default)]
    pub languages: Vec<String>,
}

/// Extracts a best-effort profile from CV text.
///
/// The LLM path is retry-wrapped like every other model call; failures fall
/// back to pattern extraction rather than propagating.
pub async fn extract_profile(
    cv_text: &str,
    llm: &Arc<dyn LlmBackend>,
    retry: RetryPolicy,
) -> Profile {
    let prompt = CV_PARSE_PROMPT_TEMPLATE.replace("{cv_text}", cv_text);

    let outcome = retry_with_backoff(retry, LlmError::is_rate_limit, || {
        llm.invoke(&prompt, CV_PARSE_SYSTEM)
    })
    .await;

    match outcome {
        Ok(raw) => match extract_json_object(&raw)
            .and_then(|json| serde_json::from_str::<Profile>(json).ok())
        {
            Some(profile) => profile,
            None => {
                warn!("No usable JSON in profile extraction response, using fallback");
                fallback_profile(cv_text)
            }
        },
        Err(e) => {
            warn!("LLM profile extraction failed, using fallback: {e}");
            fallback_profile(cv_text)
        }
    }
}

/// Deterministic pattern-based extraction: email and phone by regex, name by
/// line heuristic. Everything else is marked as unavailable.
pub fn fallback_profile(text: &str) -> Profile {
    Profile {
        name: extract_name(text),
        email: extract_email(text).unwrap_or_else(not_found),
        phone: extract_phone(text).unwrap_or_else(not_found),
        location: not_found(),
        summary: "Information extracted using pattern matching".to_string(),
        education: Vec::new(),
        experience: Vec::new(),
        skills: Vec::new(),
        certifications: Vec::new(),
        languages: Vec::new(),
    }
}

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b")
            .expect("email regex compiles")
    })
}

fn phone_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // Tolerates country code, parentheses, and - . space separators
        Regex::new(r"(?:\+?\d{1,3}[-.\s]?)?\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}")
            .expect("phone regex compiles")
    })
}

pub fn extract_email(text: &str) -> Option<String> {
    email_regex().find(text).map(|m| m.as_str().to_string())
}

pub fn extract_phone(text: &str) -> Option<String> {
    phone_regex().find(text).map(|m| m.as_str().to_string())
}

/// Name heuristic: among the first 5 non-empty lines, skip known headers and
/// accept the first line of 2–4 purely alphabetic words. Falls back to the
/// first short line among the first 10, then to "Unknown Candidate".
pub fn extract_name(text: &str) -> String {
    let lines: Vec<&str> = text.lines().map(str::trim).collect();

    for line in lines.iter().filter(|l| !l.is_empty()).take(5) {
        if NAME_STOPLIST
            .iter()
            .any(|header| line.eq_ignore_ascii_case(header))
        {
            continue;
        }
        let words: Vec<&str> = line.split_whitespace().collect();
        if (2..=4).contains(&words.len()) && words.iter().all(|w| is_name_word(w)) {
            return line.to_string();
        }
    }

    for line in lines.iter().take(10) {
        if !line.is_empty() && line.len() < 50 {
            return line.to_string();
        }
    }

    unknown_candidate()
}

fn is_name_word(word: &str) -> bool {
    let stripped: String = word.chars().filter(|c| *c != '.' && *c != ',').collect();
    !stripped.is_empty() && stripped.chars().all(char::is_alphabetic)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    #[test]
    fn test_extract_email_first_match_wins() {
        let text = "Contact: jane.doe@example.com or backup jd@alt.org";
        assert_eq!(extract_email(text).unwrap(), "jane.doe@example.com");
    }

    #[test]
    fn test_extract_email_absent() {
        assert_eq!(extract_email("no contact details here"), None);
    }

    #[test]
    fn test_extract_phone_with_country_code() {
        let text = "Phone: +62 812 555 0101, available weekdays";
        assert_eq!(extract_phone(text).unwrap(), "+62 812 555 0101");
    }

    #[test]
    fn test_extract_phone_with_separators() {
        let text = "Call (555) 123-4567 after 5pm";
        assert_eq!(extract_phone(text).unwrap(), "(555) 123-4567");
    }

    #[test]
    fn test_extract_phone_absent() {
        assert_eq!(extract_phone("email only"), None);
    }

    #[test]
    fn test_name_skips_stoplist_headers() {
        let text = "CURRICULUM VITAE\n\nJane A. Doe\nSenior Engineer";
        assert_eq!(extract_name(text), "Jane A. Doe");
    }

    #[test]
    fn test_name_stoplist_is_case_insensitive() {
        let text = "Resume\nJohn Smith\njohn@example.com";
        assert_eq!(extract_name(text), "John Smith");
    }

    #[test]
    fn test_name_rejects_lines_with_digits() {
        let text = "Section 42\nMary Jane Watson\n";
        assert_eq!(extract_name(text), "Mary Jane Watson");
    }

    #[test]
    fn test_name_falls_back_to_first_short_line() {
        // One-word lines fail the 2-4 word check; first short line wins
        let text = "Cheng\nsome-handle\n";
        assert_eq!(extract_name(text), "Cheng");
    }

    #[test]
    fn test_name_unknown_when_nothing_usable() {
        let long_line = "x".repeat(60);
        let text = format!("{long_line}\n{long_line}\n");
        assert_eq!(extract_name(&text), UNKNOWN_CANDIDATE);
    }

    #[test]
    fn test_fallback_profile_populates_contact_fields() {
        let text = "Jane Doe\njane@corp.io\n+1 415 555 2671\n";
        let profile = fallback_profile(text);
        assert_eq!(profile.name, "Jane Doe");
        assert_eq!(profile.email, "jane@corp.io");
        assert_eq!(profile.phone, "+1 415 555 2671");
        assert_eq!(profile.location, NOT_FOUND);
        assert!(profile.education.is_empty());
    }

    #[test]
    fn test_profile_deserializes_with_defaults() {
        let profile: Profile = serde_json::from_str(r#"{"name": "Jane Doe"}"#).unwrap();
        assert_eq!(profile.name, "Jane Doe");
        assert_eq!(profile.email, NOT_FOUND);
        assert!(profile.skills.is_empty());
    }

    struct StaticLlm(Result<&'static str, ()>);

    #[async_trait]
    impl LlmBackend for StaticLlm {
        async fn invoke(&self, _prompt: &str, _system: &str) -> Result<String, LlmError> {
            match self.0 {
                Ok(text) => Ok(text.to_string()),
                Err(()) => Err(LlmError::Api {
                    status: 500,
                    message: "backend unavailable".to_string(),
                }),
            }
        }
    }

    #[tokio::test]
    async fn test_llm_extraction_parses_profile() {
        let llm: Arc<dyn LlmBackend> = Arc::new(StaticLlm(Ok(
            r#"{"name": "Jane Doe", "email": "jane@corp.io", "skills": ["Rust", "SQL"]}"#,
        )));
        let profile = extract_profile("cv text", &llm, RetryPolicy::default()).await;
        assert_eq!(profile.name, "Jane Doe");
        assert_eq!(profile.skills, vec!["Rust".to_string(), "SQL".to_string()]);
    }

    #[tokio::test]
    async fn test_llm_failure_falls_back_to_patterns() {
        let llm: Arc<dyn LlmBackend> = Arc::new(StaticLlm(Err(())));
        let profile = extract_profile("John Smith\njohn@x.io\n", &llm, RetryPolicy::default()).await;
        assert_eq!(profile.name, "John Smith");
        assert_eq!(profile.email, "john@x.io");
        assert_eq!(profile.summary, "Information extracted using pattern matching");
    }

    #[tokio::test]
    async fn test_non_json_response_falls_back_to_patterns() {
        let llm: Arc<dyn LlmBackend> = Arc::new(StaticLlm(Ok("I am unable to comply.")));
        let profile = extract_profile("John Smith\n", &llm, RetryPolicy::default()).await;
        assert_eq!(profile.name, "John Smith");
    }
}
