//! Error types for voicebox-spk

use thiserror::Error;

/// Speech synthesis errors
#[derive(Error, Debug)]
pub enum SpeechError {
    #[error("Text is required")]
    EmptyText,

    #[error("Text too long ({len} bytes, max {max} bytes)")]
    TextTooLong { len: usize, max: usize },

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SpeechError {
    /// True when the caller sent bad input; everything else is a server-side failure.
    pub fn is_client_error(&self) -> bool {
        matches!(self, SpeechError::EmptyText | SpeechError::TextTooLong { .. })
    }
}
