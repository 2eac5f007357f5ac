// HTTP route handlers for the Arbiter API

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
};
use arbiter_common::types::{Language, Submission, SubmissionReport};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::auth::AuthenticatedUser;
use crate::error::ApiError;
use crate::metrics;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub code: String,
    #[serde(default = "default_language")]
    pub language: Language,
}

fn default_language() -> Language {
    Language::Python3
}

#[derive(Debug, Serialize)]
pub struct LanguagesResponse {
    pub languages: Vec<Language>,
}

/// POST /api/submit/:id - Evaluate a submission against every test case of a problem
pub async fn submit(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Path(problem_id): Path<String>,
    Json(payload): Json<SubmitRequest>,
) -> Result<Json<SubmissionReport>, ApiError> {
    // Unknown problems are reported before language problems
    let problem = match state.evaluator.resolve(&problem_id).await {
        Ok(problem) => problem,
        Err(e) => {
            let err = ApiError::from(e);
            metrics::record_error(match err {
                ApiError::NotFound => "not_found",
                _ => "error",
            });
            return Err(err);
        }
    };

    if !state.languages.is_enabled(payload.language) {
        metrics::record_error("unsupported_language");
        return Err(ApiError::UnsupportedLanguage(payload.language));
    }

    let submission = Submission {
        problem_id,
        code: payload.code,
        language: payload.language,
    };

    info!(
        user = %identity.user_id,
        problem_id = %submission.problem_id,
        language = %submission.language,
        source_size = submission.code.len(),
        "Submission received"
    );

    // Dropping this future on client disconnect drops every in-flight execution
    let timer = metrics::EVALUATION_SECONDS.start_timer();
    let report = state
        .evaluator
        .evaluate_problem(&identity, &problem, &submission)
        .await;
    timer.observe_duration();

    metrics::record_report(&report);
    Ok(Json(report))
}

/// GET /status - Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// GET /languages - Languages accepted by /api/submit
pub async fn list_languages(State(state): State<Arc<AppState>>) -> Json<LanguagesResponse> {
    Json(LanguagesResponse {
        languages: state.languages.enabled_languages(),
    })
}

/// GET /metrics - Prometheus scrape endpoint
pub async fn metrics_handler() -> Result<impl IntoResponse, ApiError> {
    let body = metrics::render()?;
    Ok(([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body))
}
