use async_trait::async_trait;
use std::path::Path;

use centralita_core::{Classifier, Transcriber, TriageError};

use crate::error::{OpenAiError, Result};
use crate::types::{ChatMessage, ChatRequest, ChatResponse, ResponseFormat, TranscriptionResponse};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_TRANSCRIBE_MODEL: &str = "gpt-4o-transcribe";

/// Fixed instruction payload for call triage. The transcript is the sole
/// user-facing input; this describes the categories and the
/// action/calendar/reminder envelope the model must fill.
const TRIAGE_SYSTEM_PROMPT: &str = r#"Eres un asistente de triage de llamadas.
Clasifica la llamada en una y solo una de: spam, personal, cita_medica.
Devuelve un JSON con esta forma:
{
  "classification": "spam|personal|cita_medica",
  "reason": "explicacion breve",
  "actions": [
    {"type":"reject_and_list_robinson","payload":{}},
    {"type":"set_reminder","payload":{"title":"Llamar a ...","remindAtIso":"2025-09-19T17:00:00Z"}},
    {"type":"create_appointment","payload":{"title":"Cita medica","startIso":"2025-09-20T09:00:00Z","endIso":"2025-09-20T09:30:00Z"}}
  ],
  "calendarEntry": {"title":"","startIso":"","endIso":"","notes":""},
  "reminder": {"title":"","remindAtIso":"","notes":""}
}
Incluye solo las acciones que correspondan a la clasificacion.
Usa null en "calendarEntry" y "reminder" cuando no apliquen."#;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub chat_model: String,
    pub transcribe_model: String,
}

impl OpenAiConfig {
    /// Read the API key from `OPENAI_API_KEY`; everything else defaulted.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| OpenAiError::MissingApiKey)?;
        Ok(Self::new(api_key))
    }

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            transcribe_model: DEFAULT_TRANSCRIBE_MODEL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Driver for the external model: one call per operation, no retries, no
/// local state beyond the connection pool.
pub struct OpenAiClient {
    config: OpenAiConfig,
    http: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// Classify a transcript: fixed system instruction + the transcript as
    /// the sole user message, temperature 0, JSON response format. Returns
    /// the raw model content; shape validation happens in the core.
    pub async fn classify_and_plan(&self, transcript: &str) -> Result<String> {
        let url = format!("{}/v1/chat/completions", self.config.base_url);
        tracing::debug!(model = %self.config.chat_model, "requesting classification");
        let body = ChatRequest {
            model: self.config.chat_model.clone(),
            messages: vec![
                ChatMessage::system(TRIAGE_SYSTEM_PROMPT),
                ChatMessage::user(transcript),
            ],
            temperature: 0.0,
            response_format: ResponseFormat::json_object(),
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(OpenAiError::Api {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or(OpenAiError::EmptyResponse)
    }

    /// Transcribe an audio file via the multipart transcriptions endpoint.
    pub async fn transcribe_file(&self, path: &Path, mime_type: Option<&str>) -> Result<String> {
        let url = format!("{}/v1/audio/transcriptions", self.config.base_url);
        tracing::debug!(model = %self.config.transcribe_model, path = %path.display(), "requesting transcription");
        let bytes = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio".to_string());

        let mut part = reqwest::multipart::Part::bytes(bytes).file_name(filename);
        if let Some(mime) = mime_type {
            part = part.mime_str(mime)?;
        }

        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("model", self.config.transcribe_model.clone())
            .text("response_format", "json");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(OpenAiError::Api {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let parsed: TranscriptionResponse = response.json().await?;
        Ok(parsed.text)
    }
}

// ---------------------------------------------------------------------------
// Core port implementations
// ---------------------------------------------------------------------------

#[async_trait]
impl Classifier for OpenAiClient {
    async fn classify(&self, transcript: &str) -> centralita_core::Result<String> {
        self.classify_and_plan(transcript)
            .await
            .map_err(|e| TriageError::Classifier(e.to_string()))
    }
}

#[async_trait]
impl Transcriber for OpenAiClient {
    async fn transcribe(
        &self,
        audio_path: &Path,
        mime_type: Option<&str>,
    ) -> centralita_core::Result<String> {
        self.transcribe_file(audio_path, mime_type)
            .await
            .map_err(|e| TriageError::Transcription(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
