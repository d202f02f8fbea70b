// Error handling module
// Contains the application error type shared by every pipeline step

use thiserror::Error;
use tokio::sync::mpsc::error::SendError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Script generation failed: {0}")]
    ScriptGeneration(String),

    #[error("The text model returned an empty script")]
    EmptyScript,

    #[error("Speech synthesis failed: {0}")]
    SpeechSynthesis(String),

    #[error("Video composition failed: {0}")]
    Composition(String),

    #[error("Required tool not found: {0}")]
    ToolNotFound(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Api(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<String> for AppError {
    fn from(err: String) -> Self {
        AppError::Other(anyhow::anyhow!(err))
    }
}

impl From<&str> for AppError {
    fn from(err: &str) -> Self {
        AppError::Other(anyhow::anyhow!(err.to_string()))
    }
}

// Ошибка отправки прогресса (получатель закрыт)
impl<T> From<SendError<T>> for AppError {
    fn from(err: SendError<T>) -> Self {
        AppError::Other(anyhow::anyhow!("Failed to send message: {}", err))
    }
}

// Result type alias for application
pub type AppResult<T> = Result<T, AppError>;
