//! Configuration for speech synthesis and the audio cache

use crate::cache::DigestAlgorithm;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Speech synthesis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Directory holding synthesized audio, one file per digest
    pub cache_dir: PathBuf,

    /// URL path under which `cache_dir` is served
    pub url_prefix: String,

    /// Hash used to name cached artifacts
    pub digest: DigestAlgorithm,

    /// Serialize concurrent misses for the same text
    pub single_flight: bool,

    /// Maximum normalized text length in bytes
    pub max_text_bytes: usize,

    /// Audio encoding requested from the provider
    pub encoding: AudioEncoding,

    /// Voice settings
    pub voice: VoiceConfig,

    /// Provider API settings
    pub api: ApiConfig,
}

/// Audio encoding of synthesized artifacts
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AudioEncoding {
    #[default]
    Mp3,
    Linear16,
    OggOpus,
}

impl AudioEncoding {
    /// File extension used for cached artifacts
    pub fn extension(&self) -> &'static str {
        match self {
            AudioEncoding::Mp3 => "mp3",
            AudioEncoding::Linear16 => "wav",
            AudioEncoding::OggOpus => "ogg",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            AudioEncoding::Mp3 => "audio/mpeg",
            AudioEncoding::Linear16 => "audio/wav",
            AudioEncoding::OggOpus => "audio/ogg",
        }
    }

    /// Name understood by the Cloud Text-to-Speech API
    pub fn provider_name(&self) -> &'static str {
        match self {
            AudioEncoding::Mp3 => "MP3",
            AudioEncoding::Linear16 => "LINEAR16",
            AudioEncoding::OggOpus => "OGG_OPUS",
        }
    }
}

/// Voice configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// Language code (e.g., "th-TH", "en-US")
    pub language: String,

    /// Provider voice name
    pub name: Option<String>,

    /// Speaking rate multiplier (0.25-4.0), provider default when unset
    pub speaking_rate: Option<f32>,

    /// Pitch in semitones (-20.0 to 20.0), provider default when unset
    pub pitch: Option<f32>,
}

/// Provider API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// API endpoint URL
    pub endpoint: String,

    /// API key (falls back to GOOGLE_CLOUD_API_KEY)
    pub api_key: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("files/com_voice"),
            url_prefix: "/text_to_speech/files/com_voice".to_string(),
            digest: DigestAlgorithm::default(),
            single_flight: true,
            max_text_bytes: 5000,
            encoding: AudioEncoding::default(),
            voice: VoiceConfig::default(),
            api: ApiConfig::default(),
        }
    }
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            language: "th-TH".to_string(),
            name: Some("th-TH-Standard-A".to_string()),
            speaking_rate: None,
            pitch: None,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://texttospeech.googleapis.com".to_string(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}

impl VoiceConfig {
    pub const SPEAKING_RATE_RANGE: std::ops::RangeInclusive<f32> = 0.25..=4.0;
    pub const PITCH_RANGE: std::ops::RangeInclusive<f32> = -20.0..=20.0;

    /// Check the voice against what the synthesis API accepts
    pub fn validate(&self) -> Result<(), String> {
        // BCP-47 style tags such as "th-TH"
        let language_ok = !self.language.is_empty()
            && self.language.len() <= 32
            && self.language.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
        if !language_ok {
            return Err(format!("Invalid language code '{}'", self.language));
        }

        match self.name.as_deref() {
            Some("") => return Err("Voice name cannot be empty if provided".to_string()),
            Some(name) if name.len() > 256 || name.chars().any(char::is_control) => {
                return Err("Voice name is too long or contains control characters".to_string());
            }
            _ => {}
        }

        let tuning = [
            ("Speaking rate", self.speaking_rate, &Self::SPEAKING_RATE_RANGE),
            ("Pitch", self.pitch, &Self::PITCH_RANGE),
        ];
        for (label, value, range) in tuning {
            if let Some(value) = value {
                if !range.contains(&value) {
                    return Err(format!(
                        "{} {} outside {}..={}",
                        label,
                        value,
                        range.start(),
                        range.end()
                    ));
                }
            }
        }

        Ok(())
    }
}

impl ApiConfig {
    /// Validate API configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.endpoint.is_empty() {
            return Err("API endpoint cannot be empty".to_string());
        }

        if !self.endpoint.starts_with("https://") && !self.endpoint.starts_with("http://") {
            return Err("API endpoint must be an http(s) URL".to_string());
        }

        if self.endpoint.len() > 2048 {
            return Err("API endpoint URL too long (max 2048 chars)".to_string());
        }

        url::Url::parse(&self.endpoint)
            .map_err(|e| format!("API endpoint is not a valid URL: {}", e))?;

        if let Some(ref key) = self.api_key {
            if key.chars().any(|c| c == '\0' || c.is_control()) {
                return Err("API key contains invalid characters".to_string());
            }
        }

        if self.timeout_secs == 0 {
            return Err("API timeout must be greater than 0".to_string());
        }

        if self.timeout_secs > 300 {
            return Err("API timeout too large (max 300 seconds)".to_string());
        }

        Ok(())
    }
}

impl SpeechConfig {
    /// Upper bound accepted for `max_text_bytes`
    pub const MAX_TEXT_BYTES_LIMIT: usize = 100_000;

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.cache_dir.as_os_str().is_empty() {
            return Err("Cache directory cannot be empty".to_string());
        }

        // Validate cache directory path (prevent path traversal)
        if self.cache_dir.to_string_lossy().contains("..") {
            return Err("Cache directory path cannot contain '..'".to_string());
        }

        if !self.url_prefix.starts_with('/') {
            return Err("URL prefix must start with '/'".to_string());
        }

        if self.url_prefix.trim_end_matches('/').is_empty() {
            return Err("URL prefix cannot be the root path".to_string());
        }

        if self.url_prefix.contains("..") || self.url_prefix.contains(':') {
            return Err("URL prefix contains invalid segments".to_string());
        }

        if self.max_text_bytes == 0 {
            return Err("Max text length must be greater than 0".to_string());
        }

        if self.max_text_bytes > Self::MAX_TEXT_BYTES_LIMIT {
            return Err(format!("Max text length too large (max {} bytes)", Self::MAX_TEXT_BYTES_LIMIT));
        }

        self.voice.validate()?;
        self.api.validate()?;

        Ok(())
    }
}
