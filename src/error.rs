use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Backend request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Backend returned {status}: {detail}")]
    Backend { status: u16, detail: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Settings file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Notification permission denied")]
    PermissionDenied,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Http(e) => {
                tracing::warn!("Backend request failed: {e}");
                (StatusCode::BAD_GATEWAY, self.to_string())
            }
            AppError::Backend { .. } => {
                tracing::warn!("{self}");
                (StatusCode::BAD_GATEWAY, self.to_string())
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::Io(_) | AppError::Json(_) | AppError::Internal(_) => {
                tracing::error!("{self}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::PermissionDenied => (StatusCode::FORBIDDEN, self.to_string()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
        };

        let body = axum::Json(json!({ "error": message }));
        (status, body).into_response()
    }
}

/// Error wrapper for HTML pages: renders a minimal error page instead of JSON.
pub struct HtmlError(pub AppError);

impl From<AppError> for HtmlError {
    fn from(e: AppError) -> Self {
        HtmlError(e)
    }
}

impl IntoResponse for HtmlError {
    fn into_response(self) -> Response {
        tracing::error!("Page error: {}", self.0);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            axum::response::Html(
                "<!DOCTYPE html><html><body><h1>Something went wrong</h1></body></html>",
            ),
        )
            .into_response()
    }
}
