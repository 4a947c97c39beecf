pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::screening::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/screenings", post(handlers::handle_run_screening))
        .route(
            "/api/v1/screenings/:job_id/results",
            get(handlers::handle_get_results),
        )
        .route("/api/v1/cvs/:cv_id/profile", get(handlers::handle_get_profile))
        .with_state(state)
}
