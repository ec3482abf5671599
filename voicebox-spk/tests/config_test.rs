//! Tests for speech configuration

use std::path::PathBuf;
use voicebox_spk::cache::DigestAlgorithm;
use voicebox_spk::config::{ApiConfig, AudioEncoding, SpeechConfig, VoiceConfig};

#[test]
fn test_speech_config_default() {
    let config = SpeechConfig::default();
    assert_eq!(config.cache_dir, PathBuf::from("files/com_voice"));
    assert_eq!(config.url_prefix, "/text_to_speech/files/com_voice");
    assert_eq!(config.digest, DigestAlgorithm::LegacyMd5);
    assert_eq!(config.encoding, AudioEncoding::Mp3);
    assert!(config.single_flight);
    assert_eq!(config.max_text_bytes, 5000);
    assert!(config.validate().is_ok());
}

#[test]
fn test_voice_config_default() {
    let voice = VoiceConfig::default();
    assert_eq!(voice.language, "th-TH");
    assert_eq!(voice.name.as_deref(), Some("th-TH-Standard-A"));
    assert!(voice.speaking_rate.is_none());
    assert!(voice.pitch.is_none());
}

#[test]
fn test_speech_config_validation_cache_dir() {
    let mut config = SpeechConfig::default();
    config.cache_dir = PathBuf::from("../outside");
    assert!(config.validate().is_err());

    config.cache_dir = PathBuf::new();
    assert!(config.validate().is_err());

    config.cache_dir = PathBuf::from("/var/cache/voicebox");
    assert!(config.validate().is_ok());
}

#[test]
fn test_speech_config_validation_url_prefix() {
    let mut config = SpeechConfig::default();
    config.url_prefix = "files".to_string();
    assert!(config.validate().is_err());

    config.url_prefix = "/".to_string();
    assert!(config.validate().is_err());

    config.url_prefix = "/audio/../secret".to_string();
    assert!(config.validate().is_err());

    config.url_prefix = "/audio/".to_string();
    assert!(config.validate().is_ok());
}

#[test]
fn test_speech_config_validation_text_limit() {
    let mut config = SpeechConfig::default();
    config.max_text_bytes = 0;
    assert!(config.validate().is_err());

    config.max_text_bytes = SpeechConfig::MAX_TEXT_BYTES_LIMIT + 1;
    assert!(config.validate().is_err());

    config.max_text_bytes = SpeechConfig::MAX_TEXT_BYTES_LIMIT;
    assert!(config.validate().is_ok());
}

#[test]
fn test_voice_config_validation() {
    let mut voice = VoiceConfig::default();
    voice.language = String::new();
    assert!(voice.validate().is_err());

    voice.language = "th_TH".to_string();
    assert!(voice.validate().is_err());

    voice.language = "en-US".to_string();
    voice.name = Some(String::new());
    assert!(voice.validate().is_err());

    voice.name = Some("en-US\u{0}".to_string());
    assert!(voice.validate().is_err());

    voice.name = Some("x".repeat(257));
    assert!(voice.validate().is_err());

    voice.name = None;
    voice.speaking_rate = Some(5.0);
    assert!(voice.validate().unwrap_err().contains("Speaking rate"));

    voice.speaking_rate = Some(f32::NAN);
    assert!(voice.validate().is_err());

    voice.speaking_rate = Some(0.25);
    voice.pitch = Some(-20.5);
    assert!(voice.validate().unwrap_err().contains("Pitch"));

    voice.pitch = Some(20.0);
    assert!(voice.validate().is_ok());
}

#[test]
fn test_api_config_validation() {
    let mut api = ApiConfig::default();
    assert!(api.validate().is_ok());

    api.endpoint = "ftp://example.com".to_string();
    assert!(api.validate().is_err());

    api.endpoint = "http://127.0.0.1:9000".to_string();
    assert!(api.validate().is_ok());

    api.timeout_secs = 0;
    assert!(api.validate().is_err());

    api.timeout_secs = 301;
    assert!(api.validate().is_err());

    api.timeout_secs = 300;
    api.api_key = Some("key\nwith newline".to_string());
    assert!(api.validate().is_err());
}

#[test]
fn test_audio_encoding_properties() {
    assert_eq!(AudioEncoding::Mp3.extension(), "mp3");
    assert_eq!(AudioEncoding::Linear16.extension(), "wav");
    assert_eq!(AudioEncoding::OggOpus.extension(), "ogg");
    assert_eq!(AudioEncoding::Mp3.content_type(), "audio/mpeg");
    assert_eq!(AudioEncoding::Linear16.provider_name(), "LINEAR16");
    assert_eq!(AudioEncoding::OggOpus.provider_name(), "OGG_OPUS");
}

#[test]
fn test_speech_config_deserialize_partial() {
    let json = r#"{
        "cache_dir": "/srv/voice",
        "digest": "sha256",
        "encoding": "ogg_opus",
        "voice": { "language": "en-GB" }
    }"#;

    let config: SpeechConfig = serde_json::from_str(json).unwrap();
    assert_eq!(config.cache_dir, PathBuf::from("/srv/voice"));
    assert_eq!(config.digest, DigestAlgorithm::Sha256);
    assert_eq!(config.encoding, AudioEncoding::OggOpus);
    assert_eq!(config.voice.language, "en-GB");
    // Unset fields keep their defaults
    assert_eq!(config.voice.name.as_deref(), Some("th-TH-Standard-A"));
    assert_eq!(config.api.timeout_secs, 30);
    assert!(config.single_flight);
}

#[test]
fn test_digest_names_deserialize() {
    for (name, expected) in [
        ("legacy_md5", DigestAlgorithm::LegacyMd5),
        ("md5", DigestAlgorithm::Md5),
        ("sha256", DigestAlgorithm::Sha256),
    ] {
        let json = format!(r#"{{ "digest": "{}" }}"#, name);
        let config: SpeechConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config.digest, expected);
        assert_eq!(config.digest.to_string(), name);
    }
}
