//! TTS engine implementations

pub mod google;

use crate::config::{AudioEncoding, VoiceConfig};
use crate::error::SpeechError;
use async_trait::async_trait;
use bytes::Bytes;

pub use google::GoogleCloudTtsEngine;

/// Trait for TTS engines
#[async_trait]
pub trait TtsEngine: Send + Sync {
    /// Synthesize text to speech audio in the requested encoding
    async fn synthesize(
        &self,
        text: &str,
        voice: &VoiceConfig,
        encoding: AudioEncoding,
    ) -> Result<Bytes, SpeechError>;

    /// Check if engine is available
    fn is_available(&self) -> bool;

    /// Get engine name
    fn name(&self) -> &str;
}
