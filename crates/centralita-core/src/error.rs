use thiserror::Error;

#[derive(Debug, Error)]
pub enum TriageError {
    #[error("call not found: {0}")]
    CallNotFound(String),

    #[error("invalid classification: {0}")]
    InvalidClassification(String),

    #[error("invalid action type: {0}")]
    InvalidActionKind(String),

    #[error("classifier output is not valid JSON: {0}")]
    Parse(String),

    #[error("classifier output failed validation: {0}")]
    Validation(String),

    #[error("classifier call failed: {0}")]
    Classifier(String),

    #[error("transcription failed: {0}")]
    Transcription(String),

    #[error("storage error: {0}")]
    Storage(String),
}

pub type Result<T> = std::result::Result<T, TriageError>;
