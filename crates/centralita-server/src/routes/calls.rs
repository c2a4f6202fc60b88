use axum::extract::{Path, State};
use axum::Json;

use crate::error::AppError;
use crate::state::AppState;

/// GET /api/calls — call summaries, newest first.
pub async fn list_calls(State(app): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let calls = app.store.list_calls()?;
    Ok(Json(serde_json::json!(calls)))
}

/// GET /api/calls/:id — call with its actions, calendar entries, reminders.
pub async fn get_call(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let detail = app.store.call_detail(&id)?;
    Ok(Json(serde_json::json!(detail)))
}
