//! `openai-client` — reqwest driver for the external language model.
//!
//! Two operations, matching the two external collaborators of the triage
//! pipeline:
//! - [`OpenAiClient::transcribe_file`] — audio upload → transcript text;
//! - [`OpenAiClient::classify_and_plan`] — transcript → raw JSON document
//!   describing classification, actions, and calendar/reminder payloads.
//!
//! The client implements the core's [`Classifier`] and [`Transcriber`]
//! ports, so the pipeline never depends on this crate directly. No retry or
//! timeout policy lives here; classification degradation is the
//! orchestrator's job.
//!
//! [`Classifier`]: centralita_core::Classifier
//! [`Transcriber`]: centralita_core::Transcriber

pub mod client;
pub mod error;
pub mod types;

pub use client::{OpenAiClient, OpenAiConfig};
pub use error::OpenAiError;

/// Convenience `Result` alias for this crate.
pub type Result<T> = std::result::Result<T, OpenAiError>;
