use axum::extract::State;
use axum::Json;

use crate::error::AppError;
use crate::state::AppState;

#[derive(serde::Deserialize)]
pub struct TriageBody {
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub transcript: Option<String>,
}

/// POST /api/triage — run the full pipeline on a transcript.
///
/// Classification failures never surface here (the orchestrator falls back);
/// a 500 means persistence failed mid-sequence.
pub async fn triage_call(
    State(app): State<AppState>,
    Json(body): Json<TriageBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let transcript = match body.transcript.as_deref() {
        Some(t) if !t.is_empty() => t,
        _ => return Err(AppError::bad_request("Missing transcript")),
    };

    let outcome = centralita_core::process_transcript(
        &app.store,
        app.classifier.as_ref(),
        &app.broadcaster,
        body.source.as_deref(),
        transcript,
    )
    .await?;

    Ok(Json(serde_json::json!({
        "callId": outcome.call_id,
        "triage": outcome.triage,
    })))
}
