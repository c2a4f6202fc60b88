use axum::extract::State;
use axum::Json;

use crate::error::AppError;
use crate::state::AppState;

/// GET /api/calendar — calendar entries, latest start first.
pub async fn list_calendar(
    State(app): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let entries = app.store.list_calendar()?;
    Ok(Json(serde_json::json!(entries)))
}

/// GET /api/reminders — reminders, latest first.
pub async fn list_reminders(
    State(app): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let reminders = app.store.list_reminders()?;
    Ok(Json(serde_json::json!(reminders)))
}
