//! Persistent call store over redb.
//!
//! # Table design
//!
//! Four tables, all JSON-encoded values:
//! - `calls` — key: call id
//! - `actions` — key: call id plus a fixed-width sequence number, so a
//!   prefix range scan returns a call's actions in insertion order
//! - `calendar`, `reminders` — key: row id
//!
//! `commit` applies the triage result as a sequence of independent write
//! transactions, matching the observable contract: ordering matters for
//! live observers, but there is no cross-step atomicity. A failure mid-way
//! leaves prior steps applied (accepted partial-failure mode; a single
//! wrapping transaction would strengthen this without changing the success
//! path).

use redb::{Database, ReadableTable, TableDefinition};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use uuid::Uuid;

use crate::error::{Result, TriageError};
use crate::types::{
    ActionRecord, ActionRecordStatus, Call, CallClassification, CallStatus, CalendarEntry,
    Reminder, TriageResult,
};

const CALLS: TableDefinition<&str, &[u8]> = TableDefinition::new("calls");
const ACTIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("actions");
const CALENDAR: TableDefinition<&str, &[u8]> = TableDefinition::new("calendar");
const REMINDERS: TableDefinition<&str, &[u8]> = TableDefinition::new("reminders");

/// Cap for the list endpoints, matching the dashboard's page size.
const LIST_LIMIT: usize = 200;

/// Generate an opaque record identifier. Collision resistance is all that is
/// required; identifiers are not a security boundary.
pub fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

fn st(e: impl std::fmt::Display) -> TriageError {
    TriageError::Storage(e.to_string())
}

// ---------------------------------------------------------------------------
// CallDetail
// ---------------------------------------------------------------------------

/// Full detail for one call: the root row plus every derived row.
#[derive(Debug, Clone, Serialize)]
pub struct CallDetail {
    pub call: Call,
    pub actions: Vec<ActionRecord>,
    pub calendar: Vec<CalendarEntry>,
    pub reminders: Vec<Reminder>,
}

// ---------------------------------------------------------------------------
// CallStore
// ---------------------------------------------------------------------------

/// Durable store for calls and their derived records.
pub struct CallStore {
    db: Database,
}

impl CallStore {
    /// Open or create the database at `path`, ensuring all tables exist.
    pub fn open(path: &Path) -> Result<Self> {
        let db = Database::create(path).map_err(st)?;
        let wt = db.begin_write().map_err(st)?;
        wt.open_table(CALLS).map_err(st)?;
        wt.open_table(ACTIONS).map_err(st)?;
        wt.open_table(CALENDAR).map_err(st)?;
        wt.open_table(REMINDERS).map_err(st)?;
        wt.commit().map_err(st)?;
        Ok(Self { db })
    }

    fn put<T: Serialize>(
        &self,
        table: TableDefinition<&str, &[u8]>,
        key: &str,
        value: &T,
    ) -> Result<()> {
        let encoded = serde_json::to_vec(value).map_err(st)?;
        let wt = self.db.begin_write().map_err(st)?;
        {
            let mut t = wt.open_table(table).map_err(st)?;
            t.insert(key, encoded.as_slice()).map_err(st)?;
        }
        wt.commit().map_err(st)?;
        Ok(())
    }

    fn get<T: DeserializeOwned>(
        &self,
        table: TableDefinition<&str, &[u8]>,
        key: &str,
    ) -> Result<Option<T>> {
        let rt = self.db.begin_read().map_err(st)?;
        let t = rt.open_table(table).map_err(st)?;
        match t.get(key).map_err(st)? {
            Some(v) => Ok(Some(serde_json::from_slice(v.value()).map_err(st)?)),
            None => Ok(None),
        }
    }

    fn all<T: DeserializeOwned>(&self, table: TableDefinition<&str, &[u8]>) -> Result<Vec<T>> {
        let rt = self.db.begin_read().map_err(st)?;
        let t = rt.open_table(table).map_err(st)?;
        let mut rows = Vec::new();
        for entry in t.iter().map_err(st)? {
            let (_, v) = entry.map_err(st)?;
            rows.push(serde_json::from_slice(v.value()).map_err(st)?);
        }
        Ok(rows)
    }

    // -- calls --------------------------------------------------------------

    /// Insert the root row for a new call: `processing`, classification
    /// `pending`. Called once at triage start.
    pub fn create_call(&self, source: Option<&str>, transcript: &str) -> Result<Call> {
        let call = Call {
            id: new_id(),
            created_at: chrono::Utc::now(),
            source: source.unwrap_or("unknown").to_string(),
            status: CallStatus::Processing,
            transcript: transcript.to_string(),
            classification: CallClassification::Pending,
        };
        self.put(CALLS, &call.id, &call)?;
        Ok(call)
    }

    pub fn get_call(&self, id: &str) -> Result<Call> {
        self.get(CALLS, id)?
            .ok_or_else(|| TriageError::CallNotFound(id.to_string()))
    }

    /// All calls, newest first, capped at the dashboard page size.
    pub fn list_calls(&self) -> Result<Vec<Call>> {
        let mut calls: Vec<Call> = self.all(CALLS)?;
        calls.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        calls.truncate(LIST_LIMIT);
        Ok(calls)
    }

    // -- commit -------------------------------------------------------------

    /// Apply a validated triage result against an existing `processing` call.
    ///
    /// Sequence (each step its own transaction):
    /// 1. call row → `completed` with the terminal classification;
    /// 2. one action row per entry, input order preserved;
    /// 3. the calendar entry, if any;
    /// 4. the reminder, if any.
    pub fn commit(&self, call_id: &str, result: &TriageResult) -> Result<()> {
        let mut call = self.get_call(call_id)?;
        call.status = CallStatus::Completed;
        call.classification = result.classification.into();
        self.put(CALLS, call_id, &call)?;

        for (seq, action) in result.actions.iter().enumerate() {
            let record = ActionRecord {
                id: new_id(),
                call_id: call_id.to_string(),
                kind: action.kind,
                payload: action.payload.clone(),
                status: ActionRecordStatus::Pending,
            };
            self.put(ACTIONS, &action_key(call_id, seq), &record)?;
        }

        if let Some(entry) = &result.calendar_entry {
            let row = CalendarEntry {
                id: new_id(),
                call_id: call_id.to_string(),
                title: entry.title.clone(),
                start_iso: entry.start_iso.clone(),
                end_iso: entry.end_iso.clone(),
                notes: entry.notes.clone(),
            };
            self.put(CALENDAR, &row.id, &row)?;
        }

        if let Some(reminder) = &result.reminder {
            let row = Reminder {
                id: new_id(),
                call_id: call_id.to_string(),
                title: reminder.title.clone(),
                remind_at_iso: reminder.remind_at_iso.clone(),
                notes: reminder.notes.clone(),
            };
            self.put(REMINDERS, &row.id, &row)?;
        }

        Ok(())
    }

    // -- derived rows -------------------------------------------------------

    /// A call's actions in insertion order (prefix range scan over the
    /// composite key).
    pub fn actions_for(&self, call_id: &str) -> Result<Vec<ActionRecord>> {
        let lo = format!("{call_id}/");
        // '~' sorts after every sequence digit, closing the prefix range.
        let hi = format!("{call_id}/~");
        let rt = self.db.begin_read().map_err(st)?;
        let t = rt.open_table(ACTIONS).map_err(st)?;
        let mut rows = Vec::new();
        for entry in t.range(lo.as_str()..hi.as_str()).map_err(st)? {
            let (_, v) = entry.map_err(st)?;
            rows.push(serde_json::from_slice(v.value()).map_err(st)?);
        }
        Ok(rows)
    }

    pub fn calendar_for(&self, call_id: &str) -> Result<Vec<CalendarEntry>> {
        let mut rows: Vec<CalendarEntry> = self.all(CALENDAR)?;
        rows.retain(|r| r.call_id == call_id);
        Ok(rows)
    }

    pub fn reminders_for(&self, call_id: &str) -> Result<Vec<Reminder>> {
        let mut rows: Vec<Reminder> = self.all(REMINDERS)?;
        rows.retain(|r| r.call_id == call_id);
        Ok(rows)
    }

    /// Call plus all derived rows, or `CallNotFound`.
    pub fn call_detail(&self, id: &str) -> Result<CallDetail> {
        let call = self.get_call(id)?;
        Ok(CallDetail {
            actions: self.actions_for(id)?,
            calendar: self.calendar_for(id)?,
            reminders: self.reminders_for(id)?,
            call,
        })
    }

    /// All calendar entries, latest start first, capped.
    pub fn list_calendar(&self) -> Result<Vec<CalendarEntry>> {
        let mut rows: Vec<CalendarEntry> = self.all(CALENDAR)?;
        rows.sort_by(|a, b| b.start_iso.cmp(&a.start_iso));
        rows.truncate(LIST_LIMIT);
        Ok(rows)
    }

    /// All reminders, latest first, capped.
    pub fn list_reminders(&self) -> Result<Vec<Reminder>> {
        let mut rows: Vec<Reminder> = self.all(REMINDERS)?;
        rows.sort_by(|a, b| b.remind_at_iso.cmp(&a.remind_at_iso));
        rows.truncate(LIST_LIMIT);
        Ok(rows)
    }
}

/// Composite action key. The sequence is zero-padded to the width of
/// `usize::MAX`, so string ordering equals numeric ordering for every
/// possible sequence value, however many actions a document carries.
fn action_key(call_id: &str, seq: usize) -> String {
    format!("{call_id}/{seq:020}")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ActionKind, CalendarPayload, Classification, ReminderPayload, TriageAction};
    use tempfile::TempDir;

    fn open_tmp() -> (TempDir, CallStore) {
        let dir = TempDir::new().unwrap();
        let store = CallStore::open(&dir.path().join("test.redb")).unwrap();
        (dir, store)
    }

    fn action(kind: ActionKind) -> TriageAction {
        TriageAction {
            kind,
            payload: Default::default(),
        }
    }

    #[test]
    fn create_call_starts_processing_and_pending() {
        let (_dir, store) = open_tmp();
        let call = store.create_call(None, "hola").unwrap();

        assert_eq!(call.source, "unknown");
        assert_eq!(call.status, CallStatus::Processing);
        assert_eq!(call.classification, CallClassification::Pending);

        let loaded = store.get_call(&call.id).unwrap();
        assert_eq!(loaded, call);
    }

    #[test]
    fn get_call_missing_is_not_found() {
        let (_dir, store) = open_tmp();
        assert!(matches!(
            store.get_call("nope").unwrap_err(),
            TriageError::CallNotFound(_)
        ));
    }

    #[test]
    fn commit_two_actions_no_sub_objects() {
        let (_dir, store) = open_tmp();
        let call = store.create_call(Some("voicemail"), "hola").unwrap();

        let result = TriageResult {
            classification: Classification::Spam,
            reason: None,
            actions: vec![
                action(ActionKind::RejectAndListRobinson),
                action(ActionKind::NotifyUser),
            ],
            calendar_entry: None,
            reminder: None,
        };
        store.commit(&call.id, &result).unwrap();

        let detail = store.call_detail(&call.id).unwrap();
        assert_eq!(detail.call.status, CallStatus::Completed);
        assert_eq!(detail.call.classification, CallClassification::Spam);
        assert_eq!(detail.actions.len(), 2);
        assert_eq!(detail.actions[0].kind, ActionKind::RejectAndListRobinson);
        assert_eq!(detail.actions[1].kind, ActionKind::NotifyUser);
        assert!(detail.actions.iter().all(|a| a.call_id == call.id));
        assert!(detail.calendar.is_empty());
        assert!(detail.reminders.is_empty());
    }

    #[test]
    fn calendar_entry_round_trips_through_detail() {
        let (_dir, store) = open_tmp();
        let call = store.create_call(None, "quiero confirmar mi cita").unwrap();

        let result = TriageResult {
            classification: Classification::CitaMedica,
            reason: None,
            actions: vec![action(ActionKind::CreateAppointment)],
            calendar_entry: Some(CalendarPayload {
                title: "Cita médica".into(),
                start_iso: "2025-09-20T09:00:00Z".into(),
                end_iso: "2025-09-20T09:30:00Z".into(),
                notes: None,
            }),
            reminder: None,
        };
        store.commit(&call.id, &result).unwrap();

        let detail = store.call_detail(&call.id).unwrap();
        assert_eq!(detail.calendar.len(), 1);
        let entry = &detail.calendar[0];
        assert_eq!(entry.title, "Cita médica");
        assert_eq!(entry.start_iso, "2025-09-20T09:00:00Z");
        assert_eq!(entry.end_iso, "2025-09-20T09:30:00Z");
        assert_eq!(entry.call_id, call.id);
    }

    #[test]
    fn reminder_is_committed_once() {
        let (_dir, store) = open_tmp();
        let call = store.create_call(None, "llámame mañana").unwrap();

        let result = TriageResult {
            classification: Classification::Personal,
            reason: None,
            actions: vec![action(ActionKind::SetReminder)],
            calendar_entry: None,
            reminder: Some(ReminderPayload {
                title: "Llamar a Juan".into(),
                remind_at_iso: "2025-09-19T17:00:00Z".into(),
                notes: None,
            }),
        };
        store.commit(&call.id, &result).unwrap();

        let reminders = store.reminders_for(&call.id).unwrap();
        assert_eq!(reminders.len(), 1);
        assert_eq!(reminders[0].title, "Llamar a Juan");
    }

    #[test]
    fn commit_against_missing_call_fails_before_any_write() {
        let (_dir, store) = open_tmp();
        let result = TriageResult::fallback();
        assert!(matches!(
            store.commit("ghost", &result).unwrap_err(),
            TriageError::CallNotFound(_)
        ));
        assert!(store.list_calendar().unwrap().is_empty());
    }

    #[test]
    fn action_order_survives_many_entries() {
        let (_dir, store) = open_tmp();
        let call = store.create_call(None, "hola").unwrap();

        let kinds: Vec<ActionKind> = (0..12)
            .map(|i| {
                if i % 2 == 0 {
                    ActionKind::NotifyUser
                } else {
                    ActionKind::SetReminder
                }
            })
            .collect();
        let result = TriageResult {
            classification: Classification::Personal,
            reason: None,
            actions: kinds.iter().map(|k| action(*k)).collect(),
            calendar_entry: None,
            reminder: None,
        };
        store.commit(&call.id, &result).unwrap();

        let stored = store.actions_for(&call.id).unwrap();
        let stored_kinds: Vec<ActionKind> = stored.iter().map(|a| a.kind).collect();
        assert_eq!(stored_kinds, kinds);
    }

    #[test]
    fn action_keys_sort_numerically_past_four_digits() {
        let keys: Vec<String> = [0, 1, 9, 9_999, 10_000, 10_001, 123_456_789]
            .iter()
            .map(|&seq| action_key("call", seq))
            .collect();

        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(sorted, keys);
        // Every key stays inside the prefix range scanned by `actions_for`.
        assert!(keys.iter().all(|k| k.as_str() < "call/~"));
    }

    #[test]
    fn actions_do_not_leak_across_calls() {
        let (_dir, store) = open_tmp();
        let a = store.create_call(None, "a").unwrap();
        let b = store.create_call(None, "b").unwrap();

        let one_action = TriageResult {
            classification: Classification::Personal,
            reason: None,
            actions: vec![action(ActionKind::NotifyUser)],
            calendar_entry: None,
            reminder: None,
        };
        store.commit(&a.id, &one_action).unwrap();
        store.commit(&b.id, &one_action).unwrap();

        assert_eq!(store.actions_for(&a.id).unwrap().len(), 1);
        assert_eq!(store.actions_for(&b.id).unwrap().len(), 1);
        assert_eq!(store.actions_for(&a.id).unwrap()[0].call_id, a.id);
    }

    #[test]
    fn list_calls_newest_first() {
        let (_dir, store) = open_tmp();
        let first = store.create_call(None, "primera").unwrap();
        let second = store.create_call(None, "segunda").unwrap();

        let calls = store.list_calls().unwrap();
        assert_eq!(calls.len(), 2);
        // created_at ties are possible at millisecond resolution; accept
        // either order when equal, otherwise newest first.
        if first.created_at != second.created_at {
            assert_eq!(calls[0].id, second.id);
        }
    }

    #[test]
    fn list_calendar_sorted_by_start_desc() {
        let (_dir, store) = open_tmp();
        let call = store.create_call(None, "hola").unwrap();

        for start in ["2025-09-20T09:00:00Z", "2025-09-22T09:00:00Z"] {
            let result = TriageResult {
                classification: Classification::CitaMedica,
                reason: None,
                actions: vec![],
                calendar_entry: Some(CalendarPayload {
                    title: "Cita".into(),
                    start_iso: start.into(),
                    end_iso: "2025-09-22T10:00:00Z".into(),
                    notes: None,
                }),
                reminder: None,
            };
            store.commit(&call.id, &result).unwrap();
        }

        let entries = store.list_calendar().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].start_iso, "2025-09-22T09:00:00Z");
    }
}
