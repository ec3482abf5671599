//! Content-addressed audio cache
//!
//! Every artifact lives at `{dir}/{digest}.{ext}`. The path is the cache key and the
//! existence check at once; there is no index. Artifacts are never rewritten with
//! different content, so concurrent writers for the same key are harmless.

use crate::error::SpeechError;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Hash used to derive artifact names
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DigestAlgorithm {
    /// Hex of the md5 hex string, as the previous service named its files
    #[default]
    LegacyMd5,
    Md5,
    Sha256,
}

impl DigestAlgorithm {
    /// Length of the lowercase hex digest
    pub fn hex_len(&self) -> usize {
        match self {
            DigestAlgorithm::Md5 => 32,
            DigestAlgorithm::LegacyMd5 | DigestAlgorithm::Sha256 => 64,
        }
    }

    pub fn hex_digest(&self, data: &[u8]) -> String {
        match self {
            DigestAlgorithm::LegacyMd5 => hex::encode(format!("{:x}", md5::compute(data))),
            DigestAlgorithm::Md5 => format!("{:x}", md5::compute(data)),
            DigestAlgorithm::Sha256 => hex::encode(Sha256::digest(data)),
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DigestAlgorithm::LegacyMd5 => write!(f, "legacy_md5"),
            DigestAlgorithm::Md5 => write!(f, "md5"),
            DigestAlgorithm::Sha256 => write!(f, "sha256"),
        }
    }
}

/// Directory of synthesized audio addressed by text digest
#[derive(Debug, Clone)]
pub struct AudioCache {
    dir: PathBuf,
    extension: String,
    algorithm: DigestAlgorithm,
}

impl AudioCache {
    pub fn new(dir: impl Into<PathBuf>, extension: impl Into<String>, algorithm: DigestAlgorithm) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.into().trim_start_matches('.').to_string(),
            algorithm,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Digest of already-normalized text
    pub fn digest(&self, text: &str) -> String {
        self.algorithm.hex_digest(text.as_bytes())
    }

    pub fn file_name(&self, text: &str) -> String {
        format!("{}.{}", self.digest(text), self.extension)
    }

    pub fn path_for(&self, text: &str) -> PathBuf {
        self.dir.join(self.file_name(text))
    }

    /// Returns the artifact path if a file already exists for `text`.
    pub async fn lookup(&self, text: &str) -> Result<Option<PathBuf>, SpeechError> {
        let path = self.path_for(text);
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => {
                debug!("Cache hit: {}", path.display());
                Ok(Some(path))
            }
            // Storing over it would fail after synthesis
            Ok(_) => Err(SpeechError::Io(std::io::Error::new(
                ErrorKind::Other,
                format!("{} exists and is not a file", path.display()),
            ))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SpeechError::Io(e)),
        }
    }

    /// Persist `audio` at the addressed path for `text`.
    ///
    /// The bytes go to a temporary file in the cache directory which is then renamed
    /// over the target, so readers only ever see complete artifacts.
    pub async fn store(&self, text: &str, audio: Bytes) -> Result<PathBuf, SpeechError> {
        let path = self.path_for(text);
        tokio::fs::create_dir_all(&self.dir).await?;

        let size = audio.len();
        let dir = self.dir.clone();
        let target = path.clone();
        tokio::task::spawn_blocking(move || write_atomic(&dir, &target, &audio))
            .await
            .map_err(|e| SpeechError::Io(std::io::Error::new(ErrorKind::Other, e)))??;

        debug!("Stored {} bytes at {}", size, path.display());
        Ok(path)
    }

    /// True only for names this cache could have produced.
    pub fn is_artifact_name(&self, name: &str) -> bool {
        let Some((stem, ext)) = name.rsplit_once('.') else {
            return false;
        };
        ext == self.extension
            && stem.len() == self.algorithm.hex_len()
            && stem.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
    }
}

fn write_atomic(dir: &Path, target: &Path, audio: &[u8]) -> std::io::Result<()> {
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(audio)?;
    tmp.as_file().sync_all()?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file().set_permissions(std::fs::Permissions::from_mode(0o644))?;
    }

    tmp.persist(target).map_err(|e| e.error)?;
    Ok(())
}
