//! Tests for the content-addressed audio cache

use bytes::Bytes;
use tempfile::TempDir;
use voicebox_spk::cache::{AudioCache, DigestAlgorithm};
use voicebox_spk::error::SpeechError;
use voicebox_spk::normalize::normalize_text;

fn cache_in(dir: &TempDir) -> AudioCache {
    AudioCache::new(dir.path().join("com_voice"), "mp3", DigestAlgorithm::default())
}

#[test]
fn test_same_text_same_path() {
    let dir = TempDir::new().unwrap();
    let cache = cache_in(&dir);

    let first = cache.path_for(&normalize_text("  สวัสดีครับ\n"));
    let second = cache.path_for(&normalize_text("สวัสดีครับ"));
    assert_eq!(first, second);
    assert_eq!(first.parent().unwrap(), cache.dir());
}

#[test]
fn test_different_text_different_path() {
    let dir = TempDir::new().unwrap();
    let cache = cache_in(&dir);
    assert_ne!(cache.path_for("hello"), cache.path_for("hello "));
}

#[test]
fn test_algorithm_changes_name() {
    let legacy = AudioCache::new("voice", "mp3", DigestAlgorithm::LegacyMd5);
    let md5 = AudioCache::new("voice", "mp3", DigestAlgorithm::Md5);
    let sha = AudioCache::new("voice", "mp3", DigestAlgorithm::Sha256);
    assert_ne!(md5.file_name("hello"), sha.file_name("hello"));
    assert_ne!(legacy.file_name("hello"), sha.file_name("hello"));
    assert_eq!(legacy.digest("hello").len(), 64);
    assert_eq!(md5.digest("hello").len(), 32);
    assert_eq!(sha.digest("hello").len(), 64);

    // Names are only accepted by the cache that produces them
    assert!(!md5.is_artifact_name(&legacy.file_name("hello")));
    assert!(!legacy.is_artifact_name(&md5.file_name("hello")));
}

#[test]
fn test_default_names_match_previous_service() {
    let cache = AudioCache::new("files/com_voice", "mp3", DigestAlgorithm::default());
    assert_eq!(
        cache.file_name(&normalize_text("สวัสดีครับ\n")),
        "3936653931636136353931663164363866306336656265336161316633653964.mp3"
    );
    assert_eq!(
        cache.path_for("hello"),
        std::path::PathBuf::from(
            "files/com_voice/3564343134303261626334623261373662393731396439313130313763353932.mp3"
        )
    );
}

#[tokio::test]
async fn test_lookup_missing_directory_is_miss() {
    let dir = TempDir::new().unwrap();
    let cache = cache_in(&dir);
    assert!(!cache.dir().exists());
    assert_eq!(cache.lookup("hello").await.unwrap(), None);
}

#[tokio::test]
async fn test_store_creates_directories_and_file() {
    let dir = TempDir::new().unwrap();
    let cache = AudioCache::new(dir.path().join("a").join("b"), "mp3", DigestAlgorithm::Md5);

    let path = cache.store("hello", Bytes::from_static(b"ID3 audio")).await.unwrap();
    assert_eq!(path, cache.path_for("hello"));
    assert_eq!(std::fs::read(&path).unwrap(), b"ID3 audio");
    assert_eq!(cache.lookup("hello").await.unwrap(), Some(path));
}

#[tokio::test]
async fn test_store_leaves_no_temp_files() {
    let dir = TempDir::new().unwrap();
    let cache = cache_in(&dir);

    cache.store("one", Bytes::from_static(b"1")).await.unwrap();
    cache.store("two", Bytes::from_static(b"2")).await.unwrap();

    let names: Vec<String> = std::fs::read_dir(cache.dir())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names.len(), 2);
    assert!(names.iter().all(|n| cache.is_artifact_name(n)));
}

#[tokio::test]
async fn test_store_overwrites_existing_artifact() {
    let dir = TempDir::new().unwrap();
    let cache = cache_in(&dir);

    cache.store("hello", Bytes::from_static(b"first")).await.unwrap();
    let path = cache.store("hello", Bytes::from_static(b"second")).await.unwrap();
    assert_eq!(std::fs::read(path).unwrap(), b"second");
}

#[tokio::test]
async fn test_directory_at_artifact_path_is_an_error() {
    let dir = TempDir::new().unwrap();
    let cache = cache_in(&dir);
    std::fs::create_dir_all(cache.path_for("hello")).unwrap();
    assert!(matches!(cache.lookup("hello").await, Err(SpeechError::Io(_))));
}

#[test]
fn test_lookup_from_blocking_context() {
    let dir = TempDir::new().unwrap();
    let cache = cache_in(&dir);
    std::fs::create_dir_all(cache.dir()).unwrap();
    std::fs::write(cache.path_for("cached"), b"audio").unwrap();

    let hit = tokio_test::block_on(cache.lookup("cached")).unwrap();
    assert_eq!(hit, Some(cache.path_for("cached")));
}
