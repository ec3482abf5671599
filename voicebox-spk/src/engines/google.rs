//! Google Cloud Text-to-Speech engine (REST, API key auth)

use crate::config::{ApiConfig, AudioEncoding, VoiceConfig};
use crate::engines::TtsEngine;
use crate::error::SpeechError;
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use bytes::Bytes;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

/// Environment variable consulted when no key is configured
pub const API_KEY_ENV: &str = "GOOGLE_CLOUD_API_KEY";

/// Largest response body accepted from the provider
pub const MAX_RESPONSE_SIZE: usize = 50 * 1024 * 1024;

pub struct GoogleCloudTtsEngine {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    max_response_size: usize,
}

impl GoogleCloudTtsEngine {
    /// Create a new Google Cloud TTS engine
    pub fn new(endpoint: String, api_key: Option<String>, timeout_secs: u64) -> Result<Self, SpeechError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| SpeechError::Engine(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
            max_response_size: MAX_RESPONSE_SIZE,
        })
    }

    pub fn with_max_response_size(mut self, bytes: usize) -> Self {
        self.max_response_size = bytes;
        self
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self, SpeechError> {
        Self::new(config.endpoint.clone(), config.api_key.clone(), config.timeout_secs)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty()))
    }

    /// JSON body for `text:synthesize`
    pub fn request_body(text: &str, voice: &VoiceConfig, encoding: AudioEncoding) -> Value {
        let mut voice_json = json!({ "languageCode": voice.language });
        if let Some(ref name) = voice.name {
            voice_json["name"] = json!(name);
        }

        let mut audio_config = json!({ "audioEncoding": encoding.provider_name() });
        if let Some(rate) = voice.speaking_rate {
            audio_config["speakingRate"] = json!(rate);
        }
        if let Some(pitch) = voice.pitch {
            audio_config["pitch"] = json!(pitch);
        }

        json!({
            "input": { "text": text },
            "voice": voice_json,
            "audioConfig": audio_config,
        })
    }
}

#[async_trait]
impl TtsEngine for GoogleCloudTtsEngine {
    async fn synthesize(
        &self,
        text: &str,
        voice: &VoiceConfig,
        encoding: AudioEncoding,
    ) -> Result<Bytes, SpeechError> {
        let api_key = self
            .resolve_api_key()
            .ok_or_else(|| SpeechError::Engine("Google Cloud API key not provided".to_string()))?;

        let url = format!("{}/v1/text:synthesize", self.endpoint);
        debug!("Requesting synthesis of {} bytes from {}", text.len(), url);

        let response = self
            .client
            .post(&url)
            .query(&[("key", api_key.as_str())])
            .json(&Self::request_body(text, voice, encoding))
            .send()
            .await
            .map_err(|e| SpeechError::Engine(format!("Google Cloud API request failed: {}", e.without_url())))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            warn!("Google Cloud TTS returned {}", status);
            return Err(SpeechError::Engine(format!("Google Cloud API error ({}): {}", status, error_text)));
        }

        // Refuse before buffering when the size is announced
        if let Some(content_length) = response.content_length() {
            if content_length > self.max_response_size as u64 {
                return Err(SpeechError::Engine(format!(
                    "Google Cloud response too large ({} bytes, max {} bytes)",
                    content_length, self.max_response_size
                )));
            }
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| SpeechError::Engine(format!("Failed to read Google Cloud response: {}", e.without_url())))?;

        if body.len() > self.max_response_size {
            return Err(SpeechError::Engine(format!(
                "Google Cloud response too large ({} bytes, max {} bytes)",
                body.len(),
                self.max_response_size
            )));
        }

        let response_json: Value = serde_json::from_slice(&body)
            .map_err(|e| SpeechError::Engine(format!("Failed to parse Google Cloud response: {}", e)))?;

        let audio_content = response_json
            .get("audioContent")
            .and_then(|v| v.as_str())
            .ok_or_else(|| SpeechError::Engine("Missing audioContent in Google Cloud response".to_string()))?;

        let audio_bytes = general_purpose::STANDARD
            .decode(audio_content)
            .map_err(|e| SpeechError::Engine(format!("Failed to decode base64 audio: {}", e)))?;

        if audio_bytes.is_empty() {
            return Err(SpeechError::Engine("Google Cloud returned empty audio".to_string()));
        }

        Ok(Bytes::from(audio_bytes))
    }

    fn is_available(&self) -> bool {
        self.resolve_api_key().is_some()
    }

    fn name(&self) -> &str {
        "Google Cloud TTS"
    }
}
