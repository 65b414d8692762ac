use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::domain::RequestDraft;
use super::wizard::WizardStep;

/// Draft as cached between sessions, with the step the user was on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftSnapshot {
    pub step: WizardStep,
    pub draft: RequestDraft,
    pub saved_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum DraftStoreError {
    #[error("draft key '{0}' must be non-empty and use only letters, digits, '-' or '_'")]
    InvalidKey(String),
    #[error("draft storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("draft could not be encoded or decoded: {0}")]
    Codec(#[from] serde_json::Error),
    #[error("draft storage unavailable: {0}")]
    Unavailable(String),
}

/// Keyed durable cache for in-progress requests.
pub trait DraftStore: Send + Sync {
    fn save(&self, key: &str, snapshot: &DraftSnapshot) -> Result<(), DraftStoreError>;
    fn load(&self, key: &str) -> Result<Option<DraftSnapshot>, DraftStoreError>;
    fn delete(&self, key: &str) -> Result<(), DraftStoreError>;
}

/// Stores one JSON file per key under a directory.
#[derive(Debug, Clone)]
pub struct FileDraftStore {
    dir: PathBuf,
}

impl FileDraftStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, DraftStoreError> {
        let key = validate_key(key)?;
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl DraftStore for FileDraftStore {
    fn save(&self, key: &str, snapshot: &DraftSnapshot) -> Result<(), DraftStoreError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir)?;

        let payload = serde_json::to_vec_pretty(snapshot)?;
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, payload)?;
        fs::rename(&staging, &path)?;

        debug!(path = %path.display(), "draft saved");
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Option<DraftSnapshot>, DraftStoreError> {
        let path = self.path_for(key)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn delete(&self, key: &str) -> Result<(), DraftStoreError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[derive(Debug, Default)]
pub struct InMemoryDraftStore {
    drafts: Mutex<HashMap<String, DraftSnapshot>>,
}

impl InMemoryDraftStore {
    pub fn len(&self) -> usize {
        self.drafts.lock().map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DraftStore for InMemoryDraftStore {
    fn save(&self, key: &str, snapshot: &DraftSnapshot) -> Result<(), DraftStoreError> {
        let key = validate_key(key)?;
        let mut guard = self
            .drafts
            .lock()
            .map_err(|_| DraftStoreError::Unavailable("draft mutex poisoned".to_string()))?;
        guard.insert(key, snapshot.clone());
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Option<DraftSnapshot>, DraftStoreError> {
        let key = validate_key(key)?;
        let guard = self
            .drafts
            .lock()
            .map_err(|_| DraftStoreError::Unavailable("draft mutex poisoned".to_string()))?;
        Ok(guard.get(&key).cloned())
    }

    fn delete(&self, key: &str) -> Result<(), DraftStoreError> {
        let key = validate_key(key)?;
        let mut guard = self
            .drafts
            .lock()
            .map_err(|_| DraftStoreError::Unavailable("draft mutex poisoned".to_string()))?;
        guard.remove(&key);
        Ok(())
    }
}

/// Keys are used verbatim as file stems, so only `[A-Za-z0-9_-]` is accepted.
fn validate_key(key: &str) -> Result<String, DraftStoreError> {
    let usable = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if usable {
        Ok(key.to_string())
    } else {
        Err(DraftStoreError::InvalidKey(key.to_string()))
    }
}
