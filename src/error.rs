//! Error types for the Nova assistant

use thiserror::Error;

/// Result type alias for Nova operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the assistant
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error (missing credential, bad path, invalid value)
    #[error("configuration error: {0}")]
    Config(String),

    /// Audio capture or playback error
    #[error("audio error: {0}")]
    Audio(String),

    /// Wake word engine error
    #[error("wake word error: {0}")]
    WakeWord(String),

    /// Speech-to-text error
    #[error("STT error: {0}")]
    Stt(String),

    /// Text-to-speech error
    #[error("TTS error: {0}")]
    Tts(String),

    /// Process launch error
    #[error("launch error: {0}")]
    Launch(String),

    /// Executable could not be resolved anywhere in the search roots
    #[error("not found: {0}")]
    NotFound(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
