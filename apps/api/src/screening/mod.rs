//! The CV screening pipeline: structured extraction, anonymized scoring,
//! deterministic weighted aggregation, and concurrent batch ranking.

pub mod batch;
pub mod handlers;
pub mod json_extract;
pub mod models;
pub mod profile;
pub mod rubric;
pub mod scorer;
