//! External-collaborator ports and the triage orchestrator.
//!
//! `run_triage` drives transcript → raw model output → validated
//! [`TriageResult`], degrading to [`TriageResult::fallback`] on any failure.
//! An ambiguous or malformed model response must never block the caller or
//! leave a call stuck in `processing`, so this function has no error path.

use async_trait::async_trait;
use std::path::Path;

use crate::error::Result;
use crate::schema;
use crate::types::TriageResult;

// ---------------------------------------------------------------------------
// Ports
// ---------------------------------------------------------------------------

/// Wraps the external model call: transcript in, raw (untyped) structured
/// text out. Expected to be a JSON document but not guaranteed. No retry or
/// timeout policy here; degradation belongs to the orchestrator.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, transcript: &str) -> Result<String>;
}

/// Opaque audio-to-text collaborator. Failures surface as
/// `TriageError::Transcription`, distinct from triage errors; no call row
/// is created for a failed transcription.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio_path: &Path, mime_type: Option<&str>) -> Result<String>;
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Classify a transcript and validate the model's response.
///
/// Never fails outward: classifier transport errors, non-JSON output, and
/// schema-nonconforming output all yield the deterministic fallback result.
/// A valid result passes through unchanged beyond validator defaults.
/// Stateless; concurrent invocations share nothing.
pub async fn run_triage(classifier: &dyn Classifier, transcript: &str) -> TriageResult {
    let raw = match classifier.classify(transcript).await {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!(error = %e, "classifier call failed, using fallback");
            return TriageResult::fallback();
        }
    };

    match schema::parse_and_validate(&raw) {
        Ok(result) => result,
        Err(e) => {
            tracing::warn!(error = %e, "classifier output rejected, using fallback");
            TriageResult::fallback()
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
