use anyhow::{Context, Result};

use crate::screening::rubric::Weights;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or invalid.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub anthropic_api_key: String,
    pub port: u16,
    pub rust_log: String,
    /// Scoring weight table. Defaults to the fixed rubric weights; can be
    /// overridden via SCORING_WEIGHTS as a JSON object. Validated at startup —
    /// a table that does not sum to 1.0 is fatal.
    pub weights: Weights,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let weights = match std::env::var("SCORING_WEIGHTS") {
            Ok(json) => serde_json::from_str::<Weights>(&json)
                .context("SCORING_WEIGHTS must be a JSON object with the five criterion keys")?,
            Err(_) => Weights::default(),
        };
        weights
            .validate()
            .map_err(|e| anyhow::anyhow!("invalid SCORING_WEIGHTS: {e}"))?;

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            weights,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
