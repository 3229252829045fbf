//! Persistent key/value preferences
//!
//! Backing store for tutorial completion flags and the secure settings the
//! settings screens read and write. Values are booleans or integers.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Result, TvSettingsError};

/// A stored preference value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrefValue {
    Bool(bool),
    Int(i64),
}

/// Key/value store with per-commit atomicity.
///
/// `put_bools` commits all entries in one write; separate calls are
/// separate commits.
pub trait PreferenceStore: Send + Sync {
    /// Read a boolean, or `default` if absent or not a boolean
    fn get_bool(&self, key: &str, default: bool) -> bool;

    /// Read an integer, or `default` if absent or not an integer
    fn get_int(&self, key: &str, default: i64) -> i64;

    /// Whether any value is stored under `key`
    fn contains(&self, key: &str) -> bool;

    /// Store several booleans in a single commit
    fn put_bools(&self, entries: &[(&str, bool)]) -> Result<()>;

    /// Store an integer
    fn put_int(&self, key: &str, value: i64) -> Result<()>;

    /// Store a boolean
    fn put_bool(&self, key: &str, value: bool) -> Result<()> {
        self.put_bools(&[(key, value)])
    }
}

fn lookup_bool(map: &HashMap<String, PrefValue>, key: &str, default: bool) -> bool {
    match map.get(key) {
        Some(PrefValue::Bool(value)) => *value,
        _ => default,
    }
}

fn lookup_int(map: &HashMap<String, PrefValue>, key: &str, default: i64) -> i64 {
    match map.get(key) {
        Some(PrefValue::Int(value)) => *value,
        _ => default,
    }
}

/// In-memory preferences, lost on drop
#[derive(Debug, Default)]
pub struct MemoryPreferences {
    values: RwLock<HashMap<String, PrefValue>>,
}

impl MemoryPreferences {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }
}

impl PreferenceStore for MemoryPreferences {
    fn get_bool(&self, key: &str, default: bool) -> bool {
        lookup_bool(&self.values.read(), key, default)
    }

    fn get_int(&self, key: &str, default: i64) -> i64 {
        lookup_int(&self.values.read(), key, default)
    }

    fn contains(&self, key: &str) -> bool {
        self.values.read().contains_key(key)
    }

    fn put_bools(&self, entries: &[(&str, bool)]) -> Result<()> {
        let mut values = self.values.write();
        for (key, value) in entries {
            values.insert((*key).to_string(), PrefValue::Bool(*value));
        }
        Ok(())
    }

    fn put_int(&self, key: &str, value: i64) -> Result<()> {
        self.values.write().insert(key.to_string(), PrefValue::Int(value));
        Ok(())
    }
}

/// Preferences persisted as a JSON object.
///
/// The whole map is rewritten on every commit, through a temporary file and
/// a rename, so readers never observe a half-written file.
#[derive(Debug)]
pub struct FilePreferences {
    path: PathBuf,
    values: RwLock<HashMap<String, PrefValue>>,
}

impl FilePreferences {
    /// Open a store, starting empty if the file is missing or unreadable
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let values = match std::fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(values) => values,
                Err(e) => {
                    warn!("Ignoring corrupt preferences file {:?}: {}", path, e);
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Preferences file {:?} not found, starting empty", path);
                HashMap::new()
            }
            Err(e) => {
                warn!("Could not read preferences file {:?}: {}", path, e);
                HashMap::new()
            }
        };

        Self {
            path,
            values: RwLock::new(values),
        }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn commit(&self, values: &HashMap<String, PrefValue>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let contents = serde_json::to_string_pretty(values)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        std::fs::write(&tmp, contents)?;
        std::fs::rename(&tmp, &self.path).map_err(|e| {
            TvSettingsError::Store(format!("rename {:?} -> {:?}: {}", tmp, self.path, e))
        })?;

        debug!("Committed {} preferences to {:?}", values.len(), self.path);
        Ok(())
    }

    /// Apply `change` to a copy of the map and keep it only once it is on disk
    fn update(&self, change: impl FnOnce(&mut HashMap<String, PrefValue>)) -> Result<()> {
        let mut values = self.values.write();
        let mut next = values.clone();
        change(&mut next);
        self.commit(&next)?;
        *values = next;
        Ok(())
    }
}

impl PreferenceStore for FilePreferences {
    fn get_bool(&self, key: &str, default: bool) -> bool {
        lookup_bool(&self.values.read(), key, default)
    }

    fn get_int(&self, key: &str, default: i64) -> i64 {
        lookup_int(&self.values.read(), key, default)
    }

    fn contains(&self, key: &str) -> bool {
        self.values.read().contains_key(key)
    }

    fn put_bools(&self, entries: &[(&str, bool)]) -> Result<()> {
        self.update(|values| {
            for (key, value) in entries {
                values.insert((*key).to_string(), PrefValue::Bool(*value));
            }
        })
    }

    fn put_int(&self, key: &str, value: i64) -> Result<()> {
        self.update(|values| {
            values.insert(key.to_string(), PrefValue::Int(value));
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_defaults() {
        let prefs = MemoryPreferences::new();
        assert!(!prefs.get_bool("missing", false));
        assert!(prefs.get_bool("missing", true));
        assert_eq!(prefs.get_int("missing", 7), 7);
        assert!(prefs.is_empty());
    }

    #[test]
    fn test_type_mismatch_returns_default() {
        let prefs = MemoryPreferences::new();
        prefs.put_int("setup_version", 3).unwrap();
        assert!(prefs.get_bool("setup_version", true));
        assert_eq!(prefs.get_int("setup_version", 0), 3);
    }

    #[test]
    fn test_batch_put() {
        let prefs = MemoryPreferences::new();
        prefs.put_bools(&[("a", true), ("b", false)]).unwrap();
        assert!(prefs.get_bool("a", false));
        assert!(!prefs.get_bool("b", true));
        assert!(prefs.contains("b"));
        assert_eq!(prefs.len(), 2);
    }

    #[test]
    fn test_file_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs").join("preferences.json");

        let prefs = FilePreferences::open(&path);
        prefs.put_bool("tutorial_intro", true).unwrap();
        prefs.put_int("setup_version", 2).unwrap();
        drop(prefs);

        let reopened = FilePreferences::open(&path);
        assert!(reopened.get_bool("tutorial_intro", false));
        assert_eq!(reopened.get_int("setup_version", 0), 2);
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        std::fs::write(&path, "{ not json").unwrap();

        let prefs = FilePreferences::open(&path);
        assert!(!prefs.contains("anything"));

        prefs.put_bool("tutorial_intro", true).unwrap();
        let reopened = FilePreferences::open(&path);
        assert!(reopened.get_bool("tutorial_intro", false));
    }

    #[test]
    fn test_failed_commit_keeps_memory_and_disk_in_step() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();
        let path = blocker.join("preferences.json");

        let prefs = FilePreferences::open(&path);
        assert!(prefs.put_bool("tutorial_intro", true).is_err());
        assert!(prefs.put_int("setup_version", 3).is_err());
        assert!(!prefs.get_bool("tutorial_intro", false));
        assert!(!prefs.contains("setup_version"));

        let reopened = FilePreferences::open(&path);
        assert!(!reopened.get_bool("tutorial_intro", false));
    }
}
