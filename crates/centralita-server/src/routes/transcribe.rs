use axum::extract::{Multipart, State};
use axum::Json;
use std::io::Write;

use crate::error::AppError;
use crate::state::AppState;

/// POST /api/transcribe — multipart audio upload, returns the transcript.
///
/// The upload is spooled to a temp file (deleted on drop) and handed to the
/// transcriber. A failed transcription is a 500 with a generic body; no call
/// row is created here.
pub async fn transcribe_audio(
    State(app): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<serde_json::Value>, AppError> {
    let mut audio: Option<(Vec<u8>, Option<String>, String)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(format!("malformed multipart body: {e}")))?
    {
        if field.name() != Some("audio") {
            continue;
        }
        let mime = field.content_type().map(|m| m.to_string());
        let filename = field.file_name().unwrap_or("audio").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::bad_request(format!("malformed multipart body: {e}")))?;
        audio = Some((bytes.to_vec(), mime, filename));
        break;
    }

    let Some((bytes, mime, filename)) = audio else {
        return Err(AppError::bad_request("Missing audio file"));
    };
    tracing::info!(size = bytes.len(), filename = %filename, "audio upload received");

    let mut tmp = tempfile::NamedTempFile::new().map_err(|e| AppError(e.into()))?;
    tmp.write_all(&bytes).map_err(|e| AppError(e.into()))?;

    let transcript = app
        .transcriber
        .transcribe(tmp.path(), mime.as_deref())
        .await?;

    Ok(Json(serde_json::json!({ "transcript": transcript })))
}
