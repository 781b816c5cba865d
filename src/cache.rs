//! Persistent wallpaper metadata cache.
//!
//! Maps wallpaper id to the raw detail payload so enrichment never refetches
//! a wallpaper it has already seen. The whole map lives in memory for the
//! process lifetime and is rewritten to disk on [`Cache::save`].
//!
//! # File format
//!
//! A `postcard`-encoded envelope with a format version and a map from id to
//! the JSON text of the payload. Payloads are stored as JSON text because
//! their shape is open-ended.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::wallpaper::{Payload, Wallpaper};

/// Current on-disk format version.
const CACHE_FORMAT_VERSION: u32 = 1;

/// Errors loading or saving the cache file.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Reading, writing or renaming the cache file failed.
    #[error("IO error on cache file {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The cache file is not a valid envelope.
    #[error("cache file {path} is corrupt: {reason}")]
    Corrupt {
        /// The cache file path.
        path: PathBuf,
        /// What failed to decode.
        reason: String,
    },

    /// The cache file was written by an unknown format version.
    #[error("cache file {path} has unsupported format version {version}")]
    UnsupportedVersion {
        /// The cache file path.
        path: PathBuf,
        /// Version found in the file.
        version: u32,
    },

    /// Encoding the cache for writing failed.
    #[error("failed to encode cache: {0}")]
    Encode(String),
}

impl CacheError {
    fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    version: u32,
    entries: BTreeMap<String, String>,
}

/// Id to payload map backed by a file.
#[derive(Debug, Clone, Default)]
pub struct Cache {
    /// Backing file; `None` for an in-memory cache.
    path: Option<PathBuf>,
    entries: HashMap<String, Payload>,
}

impl Cache {
    /// Loads the cache from `path`, starting empty if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the file exists but cannot be read or decoded.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let path = path.into();
        let entries = if path.is_file() {
            read_entries(&path)?
        } else {
            debug!(path = %path.display(), "cache file does not exist, starting empty");
            HashMap::new()
        };

        info!(
            entries = entries.len(),
            path = %path.display(),
            "loaded wallpaper cache"
        );
        Ok(Self {
            path: Some(path),
            entries,
        })
    }

    /// Creates an empty cache that is never written to disk.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Backing file path, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Payload> {
        self.entries.get(id)
    }

    /// Builds a wallpaper from the cached payload for `id`.
    #[must_use]
    pub fn wallpaper(&self, id: &str) -> Option<Wallpaper> {
        let mut wallpaper = Wallpaper::stub(id);
        wallpaper.merge(self.entries.get(id)?);
        Some(wallpaper)
    }

    /// Stores `payload` under `id`, replacing any previous value.
    pub fn put(&mut self, id: impl Into<String>, payload: Payload) {
        self.entries.insert(id.into(), payload);
    }

    /// Stores the wallpaper's full attribute bag under its id.
    pub fn put_wallpaper(&mut self, wallpaper: &Wallpaper) {
        self.put(wallpaper.id(), wallpaper.attributes().clone());
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cached ids in sorted order.
    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Every cached entry as a wallpaper, sorted by id.
    #[must_use]
    pub fn wallpapers(&self) -> Vec<Wallpaper> {
        self.ids()
            .into_iter()
            .filter_map(|id| self.wallpaper(id))
            .collect()
    }

    /// Rewrites the whole cache to its backing file.
    ///
    /// The parent directory is created if needed. Data is written to a sibling
    /// temporary file which then replaces the previous file. In-memory caches
    /// are left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if encoding or any filesystem step fails.
    pub fn save(&self) -> Result<(), CacheError> {
        let Some(path) = self.path.as_deref() else {
            return Ok(());
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.is_dir() {
                debug!(dir = %parent.display(), "creating cache directory");
                fs::create_dir_all(parent).map_err(|e| CacheError::io(parent, e))?;
            }
        }

        let bytes = self.encode()?;
        let temp_path = temp_path_for(path);
        fs::write(&temp_path, &bytes).map_err(|e| CacheError::io(&temp_path, e))?;
        fs::rename(&temp_path, path).map_err(|e| CacheError::io(path, e))?;

        self.log_saved(path);
        Ok(())
    }

    /// Async form of [`Cache::save`] for use inside a running fetch.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if encoding or any filesystem step fails.
    pub async fn persist(&self) -> Result<(), CacheError> {
        let Some(path) = self.path.as_deref() else {
            return Ok(());
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| CacheError::io(parent, e))?;
        }

        let bytes = self.encode()?;
        let temp_path = temp_path_for(path);
        tokio::fs::write(&temp_path, &bytes)
            .await
            .map_err(|e| CacheError::io(&temp_path, e))?;
        tokio::fs::rename(&temp_path, path)
            .await
            .map_err(|e| CacheError::io(path, e))?;

        self.log_saved(path);
        Ok(())
    }

    fn encode(&self) -> Result<Vec<u8>, CacheError> {
        let entries = self
            .entries
            .iter()
            .map(|(id, payload)| {
                serde_json::to_string(payload)
                    .map(|json| (id.clone(), json))
                    .map_err(|e| CacheError::Encode(e.to_string()))
            })
            .collect::<Result<BTreeMap<_, _>, _>>()?;
        postcard::to_stdvec(&CacheFile {
            version: CACHE_FORMAT_VERSION,
            entries,
        })
        .map_err(|e| CacheError::Encode(e.to_string()))
    }

    fn log_saved(&self, path: &Path) {
        debug!(
            entries = self.entries.len(),
            path = %path.display(),
            "saved wallpaper cache"
        );
    }
}

fn read_entries(path: &Path) -> Result<HashMap<String, Payload>, CacheError> {
    let bytes = fs::read(path).map_err(|e| CacheError::io(path, e))?;
    let file: CacheFile = postcard::from_bytes(&bytes).map_err(|e| CacheError::Corrupt {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    if file.version != CACHE_FORMAT_VERSION {
        return Err(CacheError::UnsupportedVersion {
            path: path.to_path_buf(),
            version: file.version,
        });
    }

    file.entries
        .into_iter()
        .map(|(id, json)| {
            serde_json::from_str::<Payload>(&json)
                .map(|payload| (id.clone(), payload))
                .map_err(|e| CacheError::Corrupt {
                    path: path.to_path_buf(),
                    reason: format!("entry {id}: {e}"),
                })
        })
        .collect()
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(std::ffi::OsStr::to_os_string)
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use tempfile::TempDir;

    fn payload(value: Value) -> Payload {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn test_load_missing_file_starts_empty() {
        let temp = TempDir::new().unwrap();
        let cache = Cache::load(temp.path().join("cache.bin")).unwrap();
        assert!(cache.is_empty());
        assert!(!cache.contains("abc123"));
    }

    #[test]
    fn test_put_save_load_round_trip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("dir").join("cache.bin");
        let entry = payload(json!({
            "id": "abc123",
            "path": "https://host/full/ab/wallhaven-abc123.jpg",
            "tags": [{"id": 1, "name": "forest"}],
            "ratio": "1.78"
        }));

        let mut cache = Cache::load(&path).unwrap();
        cache.put("abc123", entry.clone());
        cache.save().unwrap();
        assert!(path.is_file());

        let reloaded = Cache::load(&path).unwrap();
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.get("abc123"), Some(&entry));
    }

    #[test]
    fn test_put_overwrites_previous_value() {
        let mut cache = Cache::in_memory();
        cache.put("a", payload(json!({"views": 1})));
        cache.put("a", payload(json!({"views": 2})));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("a").and_then(|p| p.get("views")), Some(&json!(2)));
    }

    #[test]
    fn test_save_overwrites_previous_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("cache.bin");

        let mut cache = Cache::load(&path).unwrap();
        cache.put("a", payload(json!({"id": "a"})));
        cache.save().unwrap();
        cache.put("b", payload(json!({"id": "b"})));
        cache.save().unwrap();

        let reloaded = Cache::load(&path).unwrap();
        assert_eq!(reloaded.ids(), vec!["a", "b"]);
        assert!(!temp_path_for(&path).exists());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("cache.bin");
        fs::write(&path, b"\xff\xff\xff\xff\xff\xff").unwrap();
        assert!(matches!(
            Cache::load(&path),
            Err(CacheError::Corrupt { .. } | CacheError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn test_unsupported_version_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("cache.bin");
        let bytes = postcard::to_stdvec(&CacheFile {
            version: 99,
            entries: BTreeMap::new(),
        })
        .unwrap();
        fs::write(&path, bytes).unwrap();
        assert!(matches!(
            Cache::load(&path),
            Err(CacheError::UnsupportedVersion { version: 99, .. })
        ));
    }

    #[test]
    fn test_in_memory_save_is_noop() {
        let mut cache = Cache::in_memory();
        cache.put("a", Payload::new());
        assert!(cache.save().is_ok());
        assert!(cache.path().is_none());
    }

    #[test]
    fn test_wallpaper_view_of_entry() {
        let mut cache = Cache::in_memory();
        cache.put(
            "abc123",
            payload(json!({"id": "abc123", "category": "anime", "purity": "sketchy"})),
        );
        let wall = cache.wallpaper("abc123").unwrap();
        assert_eq!(wall.id(), "abc123");
        assert_eq!(wall.category(), Some(crate::wallpaper::Category::ANIME));
        assert!(cache.wallpaper("missing").is_none());
        assert_eq!(cache.wallpapers().len(), 1);
    }

    #[tokio::test]
    async fn test_persist_matches_save() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("async").join("cache.bin");
        let mut cache = Cache::load(&path).unwrap();
        cache.put("zzz999", payload(json!({"id": "zzz999", "purity": "nsfw"})));
        cache.persist().await.unwrap();

        assert!(!temp_path_for(&path).exists());
        let reloaded = Cache::load(&path).unwrap();
        assert_eq!(reloaded.ids(), vec!["zzz999"]);
        assert_eq!(reloaded.get("zzz999"), cache.get("zzz999"));
    }

    #[tokio::test]
    async fn test_persist_in_memory_is_noop() {
        let mut cache = Cache::in_memory();
        cache.put("abc123", payload(json!({"id": "abc123"})));
        cache.persist().await.unwrap();
        assert_eq!(cache.path(), None);
    }
}
