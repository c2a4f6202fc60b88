use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Terminal classification of a call, as produced by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Spam,
    Personal,
    CitaMedica,
}

impl Classification {
    pub fn all() -> &'static [Classification] {
        &[
            Classification::Spam,
            Classification::Personal,
            Classification::CitaMedica,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Classification::Spam => "spam",
            Classification::Personal => "personal",
            Classification::CitaMedica => "cita_medica",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Classification {
    type Err = crate::error::TriageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "spam" => Ok(Classification::Spam),
            "personal" => Ok(Classification::Personal),
            "cita_medica" => Ok(Classification::CitaMedica),
            _ => Err(crate::error::TriageError::InvalidClassification(
                s.to_string(),
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// CallClassification
// ---------------------------------------------------------------------------

/// Classification as stored on a `Call` row: the `pending` sentinel until
/// exactly one terminal classification is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallClassification {
    Pending,
    Spam,
    Personal,
    CitaMedica,
}

impl From<Classification> for CallClassification {
    fn from(c: Classification) -> Self {
        match c {
            Classification::Spam => CallClassification::Spam,
            Classification::Personal => CallClassification::Personal,
            Classification::CitaMedica => CallClassification::CitaMedica,
        }
    }
}

impl fmt::Display for CallClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CallClassification::Pending => "pending",
            CallClassification::Spam => "spam",
            CallClassification::Personal => "personal",
            CallClassification::CitaMedica => "cita_medica",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// CallStatus
// ---------------------------------------------------------------------------

/// Lifecycle state of a call. The only transition is
/// `Processing → Completed`; a call is never deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallStatus {
    Processing,
    Completed,
}

impl fmt::Display for CallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CallStatus::Processing => "processing",
            CallStatus::Completed => "completed",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// ActionKind
// ---------------------------------------------------------------------------

/// The four recognized follow-up action kinds a triage result may propose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    RejectAndListRobinson,
    SetReminder,
    CreateAppointment,
    NotifyUser,
}

impl ActionKind {
    pub fn all() -> &'static [ActionKind] {
        &[
            ActionKind::RejectAndListRobinson,
            ActionKind::SetReminder,
            ActionKind::CreateAppointment,
            ActionKind::NotifyUser,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::RejectAndListRobinson => "reject_and_list_robinson",
            ActionKind::SetReminder => "set_reminder",
            ActionKind::CreateAppointment => "create_appointment",
            ActionKind::NotifyUser => "notify_user",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ActionKind {
    type Err = crate::error::TriageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reject_and_list_robinson" => Ok(ActionKind::RejectAndListRobinson),
            "set_reminder" => Ok(ActionKind::SetReminder),
            "create_appointment" => Ok(ActionKind::CreateAppointment),
            "notify_user" => Ok(ActionKind::NotifyUser),
            _ => Err(crate::error::TriageError::InvalidActionKind(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// TriageResult (wire format)
// ---------------------------------------------------------------------------

/// The validated, typed outcome of one classification.
///
/// Field names follow the model's JSON envelope (camelCase for the optional
/// sub-objects), so a validated result serializes back to the same document
/// the model produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriageResult {
    pub classification: Classification,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default)]
    pub actions: Vec<TriageAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calendar_entry: Option<CalendarPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder: Option<ReminderPayload>,
}

impl TriageResult {
    /// The deterministic safe default used whenever classifier output cannot
    /// be parsed or validated: `personal`, no actions, marked `fallback`.
    pub fn fallback() -> Self {
        Self {
            classification: Classification::Personal,
            reason: Some("fallback".to_string()),
            actions: Vec::new(),
            calendar_entry: None,
            reminder: None,
        }
    }
}

/// One proposed follow-up action inside a triage result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageAction {
    #[serde(rename = "type")]
    pub kind: ActionKind,
    pub payload: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarPayload {
    pub title: String,
    pub start_iso: String,
    pub end_iso: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderPayload {
    pub title: String,
    pub remind_at_iso: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

// ---------------------------------------------------------------------------
// Stored rows
// ---------------------------------------------------------------------------

/// Root record for one transcribed interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Call {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub source: String,
    pub status: CallStatus,
    pub transcript: String,
    pub classification: CallClassification,
}

/// A recorded follow-up task derived from triage. Not executed by this
/// subsystem; immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub id: String,
    pub call_id: String,
    #[serde(rename = "type")]
    pub kind: ActionKind,
    pub payload: BTreeMap<String, serde_json::Value>,
    pub status: ActionRecordStatus,
}

/// Execution state of a stored action. Always `Pending` at creation;
/// execution belongs to a downstream consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionRecordStatus {
    Pending,
}

/// At most one per triage result. `start_iso < end_iso` is expected but not
/// enforced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEntry {
    pub id: String,
    pub call_id: String,
    pub title: String,
    pub start_iso: String,
    pub end_iso: String,
    pub notes: Option<String>,
}

/// At most one per triage result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: String,
    pub call_id: String,
    pub title: String,
    pub remind_at_iso: String,
    pub notes: Option<String>,
}

// ---------------------------------------------------------------------------
// CallEvent
// ---------------------------------------------------------------------------

/// Lifecycle event delivered to a call's subscribers. Discriminated by the
/// JSON `"type"` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CallEvent {
    Status { status: CallStatus },
    TriageCompleted { triage: TriageResult },
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
