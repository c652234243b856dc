//! Small persistent key/value preferences (`demo_mode`, `last_notes`).
//!
//! The orchestrator only sees the [`PreferenceStore`] trait. The CLI backs it
//! with [`FilePreferences`] (`~/.scorecard/preferences.toml`); tests use
//! [`MemoryPreferences`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use scorecard_shared::{Result, ScorecardError, config_dir};

pub const DEMO_MODE_KEY: &str = "demo_mode";
pub const LAST_NOTES_KEY: &str = "last_notes";

const PREFERENCES_FILE_NAME: &str = "preferences.toml";

/// Get/set access to boolean and string preferences.
pub trait PreferenceStore: Send + Sync {
    fn get_bool(&self, key: &str) -> Result<Option<bool>>;
    fn set_bool(&self, key: &str, value: bool) -> Result<()>;
    fn get_string(&self, key: &str) -> Result<Option<String>>;
    fn set_string(&self, key: &str, value: &str) -> Result<()>;
}

/// On-disk shape of the preferences file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct PreferenceFile {
    #[serde(default)]
    flags: BTreeMap<String, bool>,
    #[serde(default)]
    values: BTreeMap<String, String>,
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct MemoryPreferences {
    inner: Mutex<PreferenceFile>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with `demo_mode` already set.
    pub fn with_demo_mode(demo_mode: bool) -> Self {
        let prefs = Self::default();
        if let Ok(mut inner) = prefs.inner.lock() {
            inner.flags.insert(DEMO_MODE_KEY.into(), demo_mode);
        }
        prefs
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, PreferenceFile>> {
        self.inner
            .lock()
            .map_err(|_| ScorecardError::persistence("preference store lock poisoned"))
    }
}

impl PreferenceStore for MemoryPreferences {
    fn get_bool(&self, key: &str) -> Result<Option<bool>> {
        Ok(self.lock()?.flags.get(key).copied())
    }

    fn set_bool(&self, key: &str, value: bool) -> Result<()> {
        self.lock()?.flags.insert(key.into(), value);
        Ok(())
    }

    fn get_string(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.values.get(key).cloned())
    }

    fn set_string(&self, key: &str, value: &str) -> Result<()> {
        self.lock()?.values.insert(key.into(), value.into());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// File-backed
// ---------------------------------------------------------------------------

/// Preferences stored as TOML. Every write rewrites the whole file.
#[derive(Debug)]
pub struct FilePreferences {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FilePreferences {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// `~/.scorecard/preferences.toml`.
    pub fn default_location() -> Result<Self> {
        Ok(Self::new(config_dir()?.join(PREFERENCES_FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<PreferenceFile> {
        if !self.path.exists() {
            return Ok(PreferenceFile::default());
        }
        let content =
            std::fs::read_to_string(&self.path).map_err(|e| ScorecardError::io(&self.path, e))?;
        toml::from_str(&content).map_err(|e| {
            ScorecardError::config(format!("failed to parse {}: {e}", self.path.display()))
        })
    }

    fn update(&self, apply: impl FnOnce(&mut PreferenceFile)) -> Result<()> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| ScorecardError::persistence("preference file lock poisoned"))?;

        let mut file = self.read()?;
        apply(&mut file);

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ScorecardError::io(parent, e))?;
        }
        let content =
            toml::to_string_pretty(&file).map_err(|e| ScorecardError::config(e.to_string()))?;
        std::fs::write(&self.path, content).map_err(|e| ScorecardError::io(&self.path, e))?;
        tracing::debug!(path = %self.path.display(), "preferences written");
        Ok(())
    }
}

impl PreferenceStore for FilePreferences {
    fn get_bool(&self, key: &str) -> Result<Option<bool>> {
        Ok(self.read()?.flags.get(key).copied())
    }

    fn set_bool(&self, key: &str, value: bool) -> Result<()> {
        self.update(|file| {
            file.flags.insert(key.into(), value);
        })
    }

    fn get_string(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read()?.values.get(key).cloned())
    }

    fn set_string(&self, key: &str, value: &str) -> Result<()> {
        self.update(|file| {
            file.values.insert(key.into(), value.into());
        })
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    fn temp_prefs() -> FilePreferences {
        let dir = std::env::temp_dir().join(format!("sc_prefs_{}", Uuid::now_v7()));
        FilePreferences::new(dir.join(PREFERENCES_FILE_NAME))
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let prefs = temp_prefs();
        assert_eq!(prefs.get_bool(DEMO_MODE_KEY).unwrap(), None);
        assert_eq!(prefs.get_string(LAST_NOTES_KEY).unwrap(), None);
    }

    #[test]
    fn file_values_survive_reopen() {
        let prefs = temp_prefs();
        prefs.set_bool(DEMO_MODE_KEY, true).unwrap();
        prefs.set_string(LAST_NOTES_KEY, "Met with \"ACME\"\nsecond line").unwrap();

        let reopened = FilePreferences::new(prefs.path());
        assert_eq!(reopened.get_bool(DEMO_MODE_KEY).unwrap(), Some(true));
        assert_eq!(
            reopened.get_string(LAST_NOTES_KEY).unwrap().as_deref(),
            Some("Met with \"ACME\"\nsecond line")
        );
    }

    #[test]
    fn writes_keep_other_keys() {
        let prefs = temp_prefs();
        prefs.set_string(LAST_NOTES_KEY, "notes").unwrap();
        prefs.set_bool(DEMO_MODE_KEY, false).unwrap();
        assert_eq!(prefs.get_string(LAST_NOTES_KEY).unwrap().as_deref(), Some("notes"));
    }

    #[test]
    fn memory_store_roundtrip() {
        let prefs = MemoryPreferences::with_demo_mode(true);
        assert_eq!(prefs.get_bool(DEMO_MODE_KEY).unwrap(), Some(true));
        prefs.set_bool(DEMO_MODE_KEY, false).unwrap();
        assert_eq!(prefs.get_bool(DEMO_MODE_KEY).unwrap(), Some(false));
    }
}
