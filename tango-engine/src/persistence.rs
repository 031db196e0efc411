use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;

/// The six independently-saved keys of the persisted store. There is no
/// transaction across them; a crash mid-save is an accepted risk.
pub mod keys {
    pub const WORDS: &str = "words";
    pub const WRONG_WORDS: &str = "wrongWords";
    pub const DIARY_ENTRIES: &str = "diaryEntries";
    pub const SETTINGS: &str = "settings";
    pub const STATS: &str = "stats";
    pub const ACHIEVEMENTS: &str = "achievements";

    pub const ALL: [&str; 6] = [
        WORDS,
        WRONG_WORDS,
        DIARY_ENTRIES,
        SETTINGS,
        STATS,
        ACHIEVEMENTS,
    ];
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// The opaque key-value store the app persists into. Async boundary; the
/// engine itself never blocks on it.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn load(&self, key: &str) -> Result<Option<serde_json::Value>, StorageError>;
    async fn save(&self, key: &str, value: serde_json::Value) -> Result<(), StorageError>;
    async fn clear(&self) -> Result<(), StorageError>;
}

/// In-memory store, used in tests and as a throwaway default.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, serde_json::Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn load(&self, key: &str) -> Result<Option<serde_json::Value>, StorageError> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    async fn save(&self, key: &str, value: serde_json::Value) -> Result<(), StorageError> {
        self.entries.lock().unwrap().insert(key.to_string(), value);
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        self.entries.lock().unwrap().clear();
        Ok(())
    }
}

/// One JSON file per key under a data directory.
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn load(&self, key: &str) -> Result<Option<serde_json::Value>, StorageError> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, key: &str, value: serde_json::Value) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.root).await?;
        let json = serde_json::to_string_pretty(&value)?;
        tokio::fs::write(self.path_for(key), json).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        match tokio::fs::remove_dir_all(&self.root).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
