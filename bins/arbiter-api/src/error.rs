//! API error type and its HTTP mapping

use arbiter_common::types::Language;
use arbiter_judge::EvaluationError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Problem not found")]
    NotFound,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Language '{0}' is not enabled")]
    UnsupportedLanguage(Language),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::UnsupportedLanguage(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<EvaluationError> for ApiError {
    fn from(err: EvaluationError) -> Self {
        match err {
            EvaluationError::NotFound(_) => Self::NotFound,
            EvaluationError::Internal(e) => Self::Internal(e),
            // Handlers never pass a cancellation token
            other @ EvaluationError::Cancelled => Self::Internal(anyhow::Error::new(other)),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Internal(ref e) = self {
            error!(error = %e, "Submission error");
        }

        let body = Json(serde_json::json!({ "message": self.to_string() }));
        (self.status_code(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluation_errors_map_to_status() {
        let not_found: ApiError = EvaluationError::NotFound("x".to_string()).into();
        assert_eq!(not_found.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(not_found.to_string(), "Problem not found");

        let internal: ApiError = EvaluationError::Internal(anyhow::anyhow!("redis down")).into();
        assert_eq!(internal.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        // Details stay in the logs
        assert_eq!(internal.to_string(), "Internal server error");

        let cancelled: ApiError = EvaluationError::Cancelled.into();
        assert_eq!(cancelled.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_unsupported_language_message() {
        let err = ApiError::UnsupportedLanguage(Language::Go);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Language 'go' is not enabled");
    }
}
