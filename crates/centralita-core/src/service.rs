//! End-to-end triage pipeline.
//!
//! One `process_transcript` call is one independent unit of work: create the
//! call row, announce `processing`, classify, commit, announce completion.
//! The steps run in strict sequence; interleaving with other in-flight
//! triages happens only at await points, and each call row is mutated solely
//! by the flow that created it.

use crate::classify::{run_triage, Classifier};
use crate::error::Result;
use crate::events::Broadcaster;
use crate::store::CallStore;
use crate::types::{CallEvent, CallStatus, TriageResult};

/// What the caller gets back from a completed triage.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TriageOutcome {
    pub call_id: String,
    pub triage: TriageResult,
}

/// Triage a transcript end to end.
///
/// Classification failures never surface (the orchestrator falls back);
/// storage failures do, as `TriageError::Storage` — the call may then be
/// left mid-sequence (`processing`, or `completed` with missing derived
/// rows), which is the accepted partial-failure mode. Broadcast delivery is
/// best effort and never fails the operation.
pub async fn process_transcript(
    store: &CallStore,
    classifier: &dyn Classifier,
    broadcaster: &Broadcaster,
    source: Option<&str>,
    transcript: &str,
) -> Result<TriageOutcome> {
    let call = store.create_call(source, transcript)?;
    tracing::info!(call_id = %call.id, source = %call.source, "triage started");

    broadcaster.publish(
        &call.id,
        CallEvent::Status {
            status: CallStatus::Processing,
        },
    );

    let triage = run_triage(classifier, transcript).await;

    store.commit(&call.id, &triage)?;

    broadcaster.publish(
        &call.id,
        CallEvent::TriageCompleted {
            triage: triage.clone(),
        },
    );
    tracing::info!(call_id = %call.id, classification = %triage.classification, "triage completed");

    Ok(TriageOutcome {
        call_id: call.id,
        triage,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
