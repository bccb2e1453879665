use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use hotcue_core::HotcueError;

// ---------------------------------------------------------------------------
// Internal sentinel for 503 Service Unavailable
// ---------------------------------------------------------------------------

/// Carries an explicit 503 through the `anyhow::Error` chain, used when the
/// orchestrator is no longer taking snapshots.
#[derive(Debug)]
struct UnavailableError(String);

impl std::fmt::Display for UnavailableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for UnavailableError {}

// ---------------------------------------------------------------------------
// AppError
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl AppError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self(UnavailableError(msg.into()).into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Some(u) = self.0.downcast_ref::<UnavailableError>() {
            let body = serde_json::json!({ "error": u.0.clone() });
            return (StatusCode::SERVICE_UNAVAILABLE, axum::Json(body)).into_response();
        }

        let status = match self.0.downcast_ref::<HotcueError>() {
            Some(HotcueError::PayloadTooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
            Some(HotcueError::InvalidPayload(_) | HotcueError::TrailingData) => {
                StatusCode::BAD_REQUEST
            }
            Some(
                HotcueError::ConfigNotFound(_)
                | HotcueError::Io(_)
                | HotcueError::Yaml(_)
                | HotcueError::Json(_),
            )
            | None => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = serde_json::json!({ "error": self.0.to_string() });
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
