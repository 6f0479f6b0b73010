//! Session-local key/value persistence.
//!
//! Drafts and the language preference live behind an injected `SessionStore`
//! rather than an ambient global, so the same flow code can run against a
//! file on disk in the desktop shell and against an in-memory map in tests.

use anyhow::Result;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Key under which the in-progress draft is stored
pub const DRAFT_KEY: &str = "registrationDraft";

pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// Session store backed by a YAML file, replaced atomically on every write
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// An unreadable or unparsable session file degrades to an empty session
    fn read_map(&self) -> BTreeMap<String, String> {
        let Ok(content) = fs::read_to_string(&self.path) else {
            return BTreeMap::new();
        };

        match serde_yaml::from_str(&content) {
            Ok(map) => map,
            Err(e) => {
                log::warn!(
                    "Session file {} is unparsable ({}); starting from an empty session",
                    self.path.display(),
                    e
                );
                BTreeMap::new()
            }
        }
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = serde_yaml::to_string(map)?;

        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, content)?;
        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.read_map().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut map = self.read_map();
        map.insert(key.to_string(), value.to_string());
        self.write_map(&map)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut map = self.read_map();
        if map.remove(key).is_some() {
            self.write_map(&map)?;
        }
        Ok(())
    }
}

/// In-memory session store for tests and short-lived sessions
#[derive(Default)]
pub struct MemorySessionStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_store_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSessionStore::new(temp_dir.path().join("session.yaml"));

        assert_eq!(store.get("language"), None);

        store.set("language", "ru").unwrap();
        store.set("draft", "{}").unwrap();
        assert_eq!(store.get("language").as_deref(), Some("ru"));

        store.remove("language").unwrap();
        assert_eq!(store.get("language"), None);
        assert_eq!(store.get("draft").as_deref(), Some("{}"));
    }

    #[test]
    fn test_unparsable_session_file_degrades_to_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("session.yaml");
        std::fs::write(&path, ":{ not yaml [").unwrap();

        let store = FileSessionStore::new(&path);
        assert_eq!(store.get("anything"), None);

        // Writing through the degraded store works and repairs the file
        store.set("key", "value").unwrap();
        assert_eq!(store.get("key").as_deref(), Some("value"));
    }

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemorySessionStore::new();
        store.set("key", "value").unwrap();
        assert_eq!(store.get("key").as_deref(), Some("value"));
        store.remove("key").unwrap();
        assert_eq!(store.get("key"), None);
    }
}
