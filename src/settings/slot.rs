use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::RoyaltyError;

/// A named key-value slot that holds serialized settings.
pub trait SettingsSlot: Send {
    /// Read the value stored under `key`; `Ok(None)` when nothing is stored.
    fn load(&self, key: &str) -> Result<Option<String>, RoyaltyError>;

    /// Replace the value stored under `key`.
    fn store(&mut self, key: &str, value: &str) -> Result<(), RoyaltyError>;
}

/// Process-local slot, lost on exit.
#[derive(Debug, Default)]
pub struct MemorySlot {
    values: HashMap<String, String>,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsSlot for MemorySlot {
    fn load(&self, key: &str) -> Result<Option<String>, RoyaltyError> {
        Ok(self.values.get(key).cloned())
    }

    fn store(&mut self, key: &str, value: &str) -> Result<(), RoyaltyError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// File-backed slot: a JSON object mapping keys to stored strings.
///
/// Writes go to a temporary file in the same directory which is then renamed
/// over the target, so readers see either the old or the new document.
#[derive(Debug, Clone)]
pub struct JsonFileSlot {
    path: PathBuf,
}

impl JsonFileSlot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> Result<HashMap<String, String>, RoyaltyError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }
}

impl SettingsSlot for JsonFileSlot {
    fn load(&self, key: &str) -> Result<Option<String>, RoyaltyError> {
        Ok(self.read_document()?.remove(key))
    }

    fn store(&mut self, key: &str, value: &str) -> Result<(), RoyaltyError> {
        // A document that is not valid JSON is replaced; any other read failure
        // aborts the write so the file is left alone.
        let mut document = match self.read_document() {
            Ok(document) => document,
            Err(RoyaltyError::Json(e)) => {
                warn!(path = %self.path.display(), error = %e, "replacing corrupt settings file");
                HashMap::new()
            }
            Err(e) => return Err(RoyaltyError::SettingsPersistence(e.to_string())),
        };
        document.insert(key.to_string(), value.to_string());
        let content = serde_json::to_string_pretty(&document)?;

        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| RoyaltyError::Io(e.error))?;
        Ok(())
    }
}
