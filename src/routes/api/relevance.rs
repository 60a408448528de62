use axum::Json;
use axum::extract::State;

use crate::error::AppError;
use crate::models::relevance::{JobProcessingResult, RelevanceStatus, ToggleRequest};
use crate::routes::AppState;
use crate::toast::{Toast, ToastSink};

pub async fn status(State(state): State<AppState>) -> Result<Json<RelevanceStatus>, AppError> {
    let status = state.backend.relevance_status().await?;
    Ok(Json(status))
}

/// PUT /api/v1/relevance
///
/// Overrides the backend's scheduled relevance scoring on or off.
pub async fn update(
    State(state): State<AppState>,
    Json(input): Json<ToggleRequest>,
) -> Result<Json<RelevanceStatus>, AppError> {
    match state.backend.toggle_relevance(input.enabled).await {
        Ok(status) => {
            let word = if status.is_enabled_override { "enabled" } else { "disabled" };
            state
                .toasts
                .push(Toast::info("Success", format!("Relevance check {word}.")));
            Ok(Json(status))
        }
        Err(e) => {
            state.toasts.push(Toast::error("Error", e.to_string()));
            Err(e)
        }
    }
}

pub async fn process(
    State(state): State<AppState>,
) -> Result<Json<JobProcessingResult>, AppError> {
    let result = state.backend.process_new_jobs().await?;
    tracing::info!("Backend job processing: {} ({})", result.status, result.message);
    Ok(Json(result))
}
