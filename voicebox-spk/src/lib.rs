//! voicebox-spk: text-to-speech with a content-addressed audio cache
//!
//! Text is normalized, hashed, and looked up as `{cache_dir}/{digest}.{ext}`.
//! On a miss the configured engine synthesizes it and the audio is stored at
//! that path for every later request.

pub mod cache;
pub mod config;
pub mod engines;
pub mod error;
pub mod normalize;
pub mod service;

pub use cache::{AudioCache, DigestAlgorithm};
pub use config::{ApiConfig, AudioEncoding, SpeechConfig, VoiceConfig};
pub use engines::{GoogleCloudTtsEngine, TtsEngine};
pub use error::SpeechError;
pub use normalize::normalize_text;
pub use service::{Artifact, SpeechService};
