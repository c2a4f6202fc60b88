pub mod agenda;
pub mod calls;
pub mod events;
pub mod transcribe;
pub mod triage;

use axum::Json;

/// GET /api/health — liveness probe.
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "ok": true }))
}
