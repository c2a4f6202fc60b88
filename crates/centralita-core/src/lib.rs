pub mod classify;
pub mod error;
pub mod events;
pub mod schema;
pub mod service;
pub mod store;
pub mod types;

pub use classify::{run_triage, Classifier, Transcriber};
pub use error::{Result, TriageError};
pub use events::{Broadcaster, Subscription, SubscriptionStream};
pub use service::{process_transcript, TriageOutcome};
pub use store::{CallDetail, CallStore};
pub use types::{CallEvent, Classification, TriageResult};
