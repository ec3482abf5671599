//! Speech service: cache lookup with fallback to synthesis

use crate::cache::AudioCache;
use crate::config::SpeechConfig;
use crate::engines::{GoogleCloudTtsEngine, TtsEngine};
use crate::error::SpeechError;
use crate::normalize::normalize_text;
use dashmap::DashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// A synthesized audio file available in the cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Location on disk
    pub path: PathBuf,
    /// `{digest}.{ext}`
    pub file_name: String,
    /// URL under which the artifact is served
    pub url: String,
    /// True when the artifact existed before this request
    pub cached: bool,
}

/// Resolves text to a cached audio artifact, synthesizing on a miss
pub struct SpeechService {
    config: Arc<SpeechConfig>,
    engine: Arc<dyn TtsEngine>,
    cache: AudioCache,
    // Per-digest locks for misses currently being synthesized
    inflight: DashMap<String, Arc<Mutex<()>>>,
}

impl SpeechService {
    /// Create a service around an existing engine
    pub fn new(config: SpeechConfig, engine: Arc<dyn TtsEngine>) -> Result<Self, SpeechError> {
        config.validate().map_err(SpeechError::Config)?;

        let cache = AudioCache::new(
            config.cache_dir.clone(),
            config.encoding.extension(),
            config.digest,
        );

        Ok(Self {
            config: Arc::new(config),
            engine,
            cache,
            inflight: DashMap::new(),
        })
    }

    /// Create a service backed by Google Cloud Text-to-Speech
    pub fn from_config(config: SpeechConfig) -> Result<Self, SpeechError> {
        config.validate().map_err(SpeechError::Config)?;

        let engine = GoogleCloudTtsEngine::from_config(&config.api)?;
        if !engine.is_available() {
            // Cache hits are still served; misses fail until a key is provided.
            warn!("{} has no API key; only cached audio can be served", engine.name());
        }

        Self::new(config, Arc::new(engine))
    }

    pub fn config(&self) -> &SpeechConfig {
        &self.config
    }

    pub fn cache(&self) -> &AudioCache {
        &self.cache
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    /// Number of digests with a synthesis in progress
    pub fn in_flight(&self) -> usize {
        self.inflight.len()
    }

    pub fn artifact_url(&self, file_name: &str) -> String {
        format!("{}/{}", self.config.url_prefix.trim_end_matches('/'), file_name)
    }

    /// Normalize `raw_text` and return its artifact, synthesizing it if needed.
    pub async fn speak(&self, raw_text: &str) -> Result<Artifact, SpeechError> {
        let text = normalize_text(raw_text);

        if text.is_empty() {
            return Err(SpeechError::EmptyText);
        }

        if text.len() > self.config.max_text_bytes {
            return Err(SpeechError::TextTooLong {
                len: text.len(),
                max: self.config.max_text_bytes,
            });
        }

        if let Some(path) = self.cache.lookup(&text).await? {
            return Ok(self.artifact(&text, path, true));
        }

        if !self.config.single_flight {
            let path = self.synthesize_and_store(&text).await?;
            return Ok(self.artifact(&text, path, false));
        }

        let slot = InflightSlot::acquire(&self.inflight, self.cache.digest(&text));
        let _guard = slot.lock.lock().await;

        // Another request may have produced the artifact while we waited.
        if let Some(path) = self.cache.lookup(&text).await? {
            debug!("Artifact produced by concurrent request: {}", path.display());
            return Ok(self.artifact(&text, path, true));
        }

        let path = self.synthesize_and_store(&text).await?;
        Ok(self.artifact(&text, path, false))
    }

    async fn synthesize_and_store(&self, text: &str) -> Result<PathBuf, SpeechError> {
        let audio = self
            .engine
            .synthesize(text, &self.config.voice, self.config.encoding)
            .await?;

        let size = audio.len();
        let path = self.cache.store(text, audio).await?;
        info!("Generated {} ({} bytes) via {}", path.display(), size, self.engine.name());
        Ok(path)
    }

    fn artifact(&self, text: &str, path: PathBuf, cached: bool) -> Artifact {
        let file_name = self.cache.file_name(text);
        Artifact {
            url: self.artifact_url(&file_name),
            path,
            file_name,
            cached,
        }
    }
}

/// Shared handle on a per-digest lock; the map entry is dropped by its last user.
struct InflightSlot<'a> {
    map: &'a DashMap<String, Arc<Mutex<()>>>,
    key: String,
    lock: Arc<Mutex<()>>,
}

impl<'a> InflightSlot<'a> {
    fn acquire(map: &'a DashMap<String, Arc<Mutex<()>>>, key: String) -> Self {
        let lock = map
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone();
        Self { map, key, lock }
    }
}

impl Drop for InflightSlot<'_> {
    fn drop(&mut self) {
        // One reference in the map plus ours means nobody else is waiting.
        self.map
            .remove_if(&self.key, |_, lock| Arc::strong_count(lock) == 2);
    }
}
