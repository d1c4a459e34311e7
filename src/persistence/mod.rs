//! Key-value persistence gateway
//!
//! The game stores nothing but the three high scores, as plain strings under
//! fixed keys. Backends:
//! - `LocalStorageStore`: browser LocalStorage (WASM only)
//! - `FileStore`: flat JSON document on disk (native only)
//! - `MemoryStore`: in-process map, used by tests and as a fallback
//!
//! Read failures look exactly like absent keys; write failures are logged and dropped.

use std::collections::BTreeMap;

/// Durable string key-value store
pub trait ScoreStore {
    /// Stored value, or an empty string if the key is absent or unreadable
    fn get(&self, key: &str) -> String;
    /// Store a value (best effort)
    fn set(&mut self, key: &str, value: &str);
}

/// In-memory store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populated store
    pub fn with_values<'a>(values: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            values: values
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

impl ScoreStore for MemoryStore {
    fn get(&self, key: &str) -> String {
        self.values.get(key).cloned().unwrap_or_default()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }
}

/// Browser LocalStorage
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Default)]
pub struct LocalStorageStore;

#[cfg(target_arch = "wasm32")]
impl LocalStorageStore {
    fn storage() -> Option<web_sys::Storage> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
    }
}

#[cfg(target_arch = "wasm32")]
impl ScoreStore for LocalStorageStore {
    fn get(&self, key: &str) -> String {
        Self::storage()
            .and_then(|s| s.get_item(key).ok().flatten())
            .unwrap_or_default()
    }

    fn set(&mut self, key: &str, value: &str) {
        match Self::storage() {
            Some(storage) => {
                if storage.set_item(key, value).is_err() {
                    log::warn!("LocalStorage write failed for {}", key);
                }
            }
            None => log::warn!("LocalStorage unavailable, {} not saved", key),
        }
    }
}

/// On-disk layout of the native score file
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ScoreFile {
    #[serde(default)]
    pub values: BTreeMap<String, String>,
}

/// JSON file on disk holding a flat string map
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug)]
pub struct FileStore {
    path: std::path::PathBuf,
    file: ScoreFile,
}

#[cfg(not(target_arch = "wasm32"))]
impl FileStore {
    /// Environment variable overriding the default file location
    pub const PATH_ENV: &'static str = "NOT_SUIKA_SCORES";
    const DEFAULT_FILE: &'static str = "not_suika_scores.json";

    /// Open the store at `path`; a missing or corrupt file starts empty
    pub fn open(path: impl Into<std::path::PathBuf>) -> Self {
        let path = path.into();
        let file = std::fs::read_to_string(&path)
            .ok()
            .and_then(|json| serde_json::from_str::<ScoreFile>(&json).ok())
            .unwrap_or_default();
        log::info!("Score store at {} ({} keys)", path.display(), file.values.len());
        Self { path, file }
    }

    /// Open the store named by `NOT_SUIKA_SCORES`, or the default file in the working directory
    pub fn open_default() -> Self {
        let path = std::env::var(Self::PATH_ENV)
            .ok()
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| Self::DEFAULT_FILE.to_string());
        Self::open(path)
    }

    fn flush(&self) {
        let json = match serde_json::to_string_pretty(&self.file) {
            Ok(json) => json,
            Err(e) => {
                log::warn!("Score store encode failed: {}", e);
                return;
            }
        };
        if let Err(e) = std::fs::write(&self.path, json) {
            log::warn!("Score store write to {} failed: {}", self.path.display(), e);
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl ScoreStore for FileStore {
    fn get(&self, key: &str) -> String {
        self.file.values.get(key).cloned().unwrap_or_default()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.file.values.insert(key.to_string(), value.to_string());
        self.flush();
    }
}
