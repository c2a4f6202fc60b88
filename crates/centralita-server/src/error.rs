use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use centralita_core::TriageError;

/// Private sentinel error type used to carry an explicit HTTP 400 through
/// the `anyhow::Error` chain without touching the `TriageError` enum.
#[derive(Debug)]
struct BadRequestError(String);

impl std::fmt::Display for BadRequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for BadRequestError {}

// ---------------------------------------------------------------------------
// AppError — unified error type for HTTP responses
// ---------------------------------------------------------------------------

/// Unified error type for HTTP responses.
///
/// Server-side failures (5xx) never leak internal detail: the cause is
/// logged and the body carries a generic message. Client-side failures
/// (4xx) keep their message, which names only caller-supplied identifiers.
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl AppError {
    /// Construct a 400 Bad Request error with the given message.
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self(BadRequestError(msg.into()).into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Some(b) = self.0.downcast_ref::<BadRequestError>() {
            let body = serde_json::json!({ "error": b.0.clone() });
            return (StatusCode::BAD_REQUEST, axum::Json(body)).into_response();
        }

        let status = if let Some(e) = self.0.downcast_ref::<TriageError>() {
            match e {
                TriageError::CallNotFound(_) => StatusCode::NOT_FOUND,
                TriageError::InvalidClassification(_) | TriageError::InvalidActionKind(_) => {
                    StatusCode::BAD_REQUEST
                }
                // Parse/Validation/Classifier are recovered by the fallback
                // and should never reach a handler; Storage/Transcription
                // are genuine server-side failures.
                TriageError::Parse(_)
                | TriageError::Validation(_)
                | TriageError::Classifier(_)
                | TriageError::Transcription(_)
                | TriageError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            }
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self.0, "request failed");
            "internal error".to_string()
        } else {
            self.0.to_string()
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
