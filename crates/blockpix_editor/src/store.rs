//! Session store: string key/value persistence for editor sessions
//!
//! The editor talks to a [`SessionStore`] trait so tests run against an
//! in-memory map while the application persists to the platform config
//! directory, one file per key.

use log::debug;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

#[derive(Debug)]
pub enum StoreError {
    /// No platform config directory could be resolved
    NoConfigDir,
    Io(std::io::Error),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::NoConfigDir => write!(f, "could not determine config directory"),
            StoreError::Io(e) => write!(f, "store I/O error: {}", e),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e)
    }
}

/// String key/value persistence for sessions
pub trait SessionStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

/// Volatile store for tests and embedding without persistence
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// File-backed store under the platform config directory
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open the store at the standard per-user config location
    pub fn open() -> Result<Self, StoreError> {
        let dirs = directories::ProjectDirs::from("io", "blockpix", "blockpix")
            .ok_or(StoreError::NoConfigDir)?;
        Ok(Self::at(dirs.config_dir().to_path_buf()))
    }

    /// Open the store at an explicit directory
    pub fn at(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl SessionStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.path_for(key)).ok()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        debug!("writing {} ({} bytes)", path.display(), value.len());
        fs::write(path, value)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_round_trip() {
        let mut s = MemoryStore::new();
        assert_eq!(s.get("k"), None);
        s.set("k", "v").unwrap();
        assert_eq!(s.get("k"), Some("v".to_string()));
        s.set("k", "v2").unwrap();
        assert_eq!(s.get("k"), Some("v2".to_string()));
        s.remove("k").unwrap();
        assert_eq!(s.get("k"), None);
    }

    #[test]
    fn test_memory_store_remove_missing_is_ok() {
        let mut s = MemoryStore::new();
        assert!(s.remove("never-set").is_ok());
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = std::env::temp_dir().join(format!(
            "blockpix-store-test-{}-{:?}",
            std::process::id(),
            std::thread::current().id()
        ));
        let mut s = FileStore::at(dir.clone());
        s.set("session", "{\"a\":1}").unwrap();
        assert_eq!(s.get("session"), Some("{\"a\":1}".to_string()));
        s.remove("session").unwrap();
        assert_eq!(s.get("session"), None);
        assert!(s.remove("session").is_ok());
        let _ = fs::remove_dir_all(dir);
    }
}
