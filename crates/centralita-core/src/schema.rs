//! Schema validation for classifier output.
//!
//! The model's response is an untrusted, free-form JSON document. This module
//! is the single gate between that document and the typed [`TriageResult`]:
//! the output is either fully typed or rejected, never a partially-typed
//! hybrid.
//!
//! Strictness is split per the triage contract:
//! - `classification` and every `actions` entry are validated as a unit —
//!   any malformed value rejects the whole document;
//! - `calendarEntry` and `reminder` are optional sub-objects — a malformed
//!   sub-object is dropped to `None` without rejecting the rest.

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::error::{Result, TriageError};
use crate::types::{
    ActionKind, CalendarPayload, Classification, ReminderPayload, TriageAction, TriageResult,
};

// ---------------------------------------------------------------------------
// Raw shapes
// ---------------------------------------------------------------------------

/// First-phase shape: field presence only, no value constraints. The two
/// optional sub-objects stay as raw `Value`s so they can be invalidated
/// individually in the second phase.
#[derive(Deserialize)]
struct RawTriage {
    #[serde(default)]
    classification: Value,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    actions: Value,
    #[serde(default, rename = "calendarEntry")]
    calendar_entry: Option<Value>,
    #[serde(default)]
    reminder: Option<Value>,
}

#[derive(Deserialize)]
struct RawAction {
    #[serde(rename = "type")]
    kind: String,
    payload: Value,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Parse classifier output text and validate it into a [`TriageResult`].
///
/// Distinguishes `Parse` (not JSON at all) from `Validation` (JSON, wrong
/// shape); the orchestrator treats both the same way.
pub fn parse_and_validate(raw: &str) -> Result<TriageResult> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| TriageError::Parse(e.to_string()))?;
    validate(value)
}

/// Validate an untyped JSON document into a [`TriageResult`].
///
/// Pure function of its input: re-validating the serialization of an
/// already-valid result yields an equal result.
pub fn validate(value: Value) -> Result<TriageResult> {
    let raw: RawTriage = serde_json::from_value(value)
        .map_err(|e| TriageError::Validation(format!("not a triage object: {e}")))?;

    let classification = match raw.classification.as_str() {
        Some(s) => Classification::from_str(s)
            .map_err(|_| TriageError::Validation(format!("unrecognized classification: {s:?}")))?,
        None => {
            return Err(TriageError::Validation(
                "classification missing or not a string".to_string(),
            ))
        }
    };

    let actions = validate_actions(raw.actions)?;
    let calendar_entry = raw.calendar_entry.and_then(validate_calendar_entry);
    let reminder = raw.reminder.and_then(validate_reminder);

    Ok(TriageResult {
        classification,
        reason: raw.reason,
        actions,
        calendar_entry,
        reminder,
    })
}

fn validate_actions(value: Value) -> Result<Vec<TriageAction>> {
    let entries = match value {
        // Absent defaults to the empty sequence.
        Value::Null => return Ok(Vec::new()),
        Value::Array(entries) => entries,
        other => {
            return Err(TriageError::Validation(format!(
                "actions must be an array, got {other}"
            )))
        }
    };

    let mut actions = Vec::with_capacity(entries.len());
    for entry in entries {
        let raw: RawAction = serde_json::from_value(entry)
            .map_err(|e| TriageError::Validation(format!("malformed action entry: {e}")))?;
        let kind = ActionKind::from_str(&raw.kind)
            .map_err(|_| TriageError::Validation(format!("unrecognized action type: {:?}", raw.kind)))?;
        let payload: BTreeMap<String, Value> = match raw.payload {
            Value::Object(map) => map.into_iter().collect(),
            other => {
                return Err(TriageError::Validation(format!(
                    "action payload must be an object, got {other}"
                )))
            }
        };
        actions.push(TriageAction { kind, payload });
    }
    Ok(actions)
}

/// `None` when the sub-object is null, malformed, or missing a required
/// field. Never fails the whole document.
fn validate_calendar_entry(value: Value) -> Option<CalendarPayload> {
    let entry: CalendarPayload = serde_json::from_value(value).ok()?;
    if entry.title.is_empty() || entry.start_iso.is_empty() || entry.end_iso.is_empty() {
        return None;
    }
    Some(entry)
}

fn validate_reminder(value: Value) -> Option<ReminderPayload> {
    let reminder: ReminderPayload = serde_json::from_value(value).ok()?;
    if reminder.title.is_empty() || reminder.remind_at_iso.is_empty() {
        return None;
    }
    Some(reminder)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn valid_minimal_document() {
        let result = validate(json!({"classification": "spam"})).unwrap();
        assert_eq!(result.classification, Classification::Spam);
        assert!(result.actions.is_empty());
        assert!(result.calendar_entry.is_none());
        assert!(result.reminder.is_none());
    }

    #[test]
    fn full_appointment_document() {
        let result = validate(json!({
            "classification": "cita_medica",
            "reason": "paciente confirma cita",
            "actions": [{"type": "create_appointment", "payload": {}}],
            "calendarEntry": {
                "title": "Cita médica",
                "startIso": "2025-09-20T09:00:00Z",
                "endIso": "2025-09-20T09:30:00Z"
            }
        }))
        .unwrap();

        assert_eq!(result.classification, Classification::CitaMedica);
        assert_eq!(result.actions.len(), 1);
        assert_eq!(result.actions[0].kind, ActionKind::CreateAppointment);
        let entry = result.calendar_entry.unwrap();
        assert_eq!(entry.title, "Cita médica");
        assert_eq!(entry.start_iso, "2025-09-20T09:00:00Z");
        assert_eq!(entry.end_iso, "2025-09-20T09:30:00Z");
    }

    #[test]
    fn unknown_classification_fails_as_unit() {
        let err = validate(json!({"classification": "unknown"})).unwrap_err();
        assert!(matches!(err, TriageError::Validation(_)));
    }

    #[test]
    fn missing_classification_fails() {
        assert!(validate(json!({"actions": []})).is_err());
        assert!(validate(json!({"classification": 3})).is_err());
        assert!(validate(json!("just a string")).is_err());
    }

    #[test]
    fn unknown_action_type_fails_as_unit() {
        let err = validate(json!({
            "classification": "personal",
            "actions": [{"type": "launch_rocket", "payload": {}}]
        }))
        .unwrap_err();
        assert!(matches!(err, TriageError::Validation(_)));
    }

    #[test]
    fn action_payload_must_be_object() {
        let err = validate(json!({
            "classification": "personal",
            "actions": [{"type": "notify_user", "payload": "call me"}]
        }))
        .unwrap_err();
        assert!(matches!(err, TriageError::Validation(_)));
    }

    #[test]
    fn action_order_is_preserved() {
        let result = validate(json!({
            "classification": "cita_medica",
            "actions": [
                {"type": "create_appointment", "payload": {}},
                {"type": "notify_user", "payload": {"channel": "push"}}
            ]
        }))
        .unwrap();
        assert_eq!(result.actions[0].kind, ActionKind::CreateAppointment);
        assert_eq!(result.actions[1].kind, ActionKind::NotifyUser);
    }

    #[test]
    fn null_sub_objects_are_absent() {
        let result = validate(json!({
            "classification": "personal",
            "calendarEntry": null,
            "reminder": null
        }))
        .unwrap();
        assert!(result.calendar_entry.is_none());
        assert!(result.reminder.is_none());
    }

    #[test]
    fn malformed_calendar_entry_is_dropped_not_fatal() {
        // Missing endIso invalidates only the sub-object.
        let result = validate(json!({
            "classification": "cita_medica",
            "calendarEntry": {"title": "Cita", "startIso": "2025-09-20T09:00:00Z"}
        }))
        .unwrap();
        assert_eq!(result.classification, Classification::CitaMedica);
        assert!(result.calendar_entry.is_none());
    }

    #[test]
    fn empty_required_field_drops_sub_object() {
        let result = validate(json!({
            "classification": "personal",
            "reminder": {"title": "", "remindAtIso": "2025-09-19T17:00:00Z"}
        }))
        .unwrap();
        assert!(result.reminder.is_none());
    }

    #[test]
    fn valid_reminder_survives() {
        let result = validate(json!({
            "classification": "personal",
            "reminder": {
                "title": "Llamar a Juan",
                "remindAtIso": "2025-09-19T17:00:00Z",
                "notes": "devolver llamada"
            }
        }))
        .unwrap();
        let reminder = result.reminder.unwrap();
        assert_eq!(reminder.title, "Llamar a Juan");
        assert_eq!(reminder.notes.as_deref(), Some("devolver llamada"));
    }

    #[test]
    fn parse_failure_is_distinct_from_validation_failure() {
        assert!(matches!(
            parse_and_validate("this is not json").unwrap_err(),
            TriageError::Parse(_)
        ));
        assert!(matches!(
            parse_and_validate(r#"{"classification":"unknown"}"#).unwrap_err(),
            TriageError::Validation(_)
        ));
    }

    #[test]
    fn validation_is_idempotent() {
        let doc = json!({
            "classification": "cita_medica",
            "actions": [{"type": "set_reminder", "payload": {"title": "Llamar"}}],
            "reminder": {"title": "Llamar", "remindAtIso": "2025-09-19T17:00:00Z"}
        });
        let first = validate(doc).unwrap();
        let second = validate(serde_json::to_value(&first).unwrap()).unwrap();
        assert_eq!(first, second);
    }
}
