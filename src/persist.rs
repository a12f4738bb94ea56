use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::errors::ClientError;

/// On-disk shape of the durable session state, a single key-value entry.
#[derive(Debug, Default, Serialize, Deserialize)]
struct PersistedState {
    #[serde(rename = "chatEnded", default)]
    chat_ended: bool,
}

/// Seam between session logic and durable state.
///
/// Lifecycle: read once when a chat session is constructed, written once on
/// the end-chat action, never otherwise mutated. Clearing the store is an
/// external operation (delete the file), not something chat activity can do.
pub trait FlagStore {
    /// Read the persisted end-of-chat flag; an absent record reads as `false`.
    fn load(&self) -> Result<bool, ClientError>;

    /// Persist the flag.
    fn store(&self, ended: bool) -> Result<(), ClientError>;
}

/// File-backed store: a small JSON document under the platform data
/// directory (or an explicit path), surviving process restarts.
pub struct FileFlagStore {
    path: PathBuf,
}

impl FileFlagStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the default location `<data_dir>/storefront-chat/session.json`.
    pub fn at_default_location() -> Result<Self, ClientError> {
        let data_dir = dirs::data_dir().ok_or(ClientError::NoStateDir)?;
        Ok(Self::new(data_dir.join("storefront-chat").join("session.json")))
    }

    fn path_display(&self) -> String {
        self.path.display().to_string()
    }
}

impl FlagStore for FileFlagStore {
    fn load(&self) -> Result<bool, ClientError> {
        if !self.path.exists() {
            return Ok(false);
        }
        let raw = fs::read_to_string(&self.path).map_err(|e| ClientError::StateLoad {
            path: self.path_display(),
            source: e,
        })?;
        let state: PersistedState =
            serde_json::from_str(&raw).map_err(|e| ClientError::StateFormat {
                path: self.path_display(),
                source: e,
            })?;
        Ok(state.chat_ended)
    }

    fn store(&self, ended: bool) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| ClientError::StateStore {
                path: self.path_display(),
                source: e,
            })?;
        }
        let body = serde_json::to_string_pretty(&PersistedState { chat_ended: ended })
            .map_err(|e| ClientError::StateFormat {
                path: self.path_display(),
                source: e,
            })?;
        fs::write(&self.path, body).map_err(|e| ClientError::StateStore {
            path: self.path_display(),
            source: e,
        })
    }
}

/// In-process store for tests and ephemeral runs. Clones share one flag, so
/// a session rebuilt from a clone observes the same state (reload behavior).
#[derive(Clone, Default)]
pub struct MemoryFlagStore {
    ended: Arc<AtomicBool>,
}

impl MemoryFlagStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FlagStore for MemoryFlagStore {
    fn load(&self) -> Result<bool, ClientError> {
        Ok(self.ended.load(Ordering::SeqCst))
    }

    fn store(&self, ended: bool) -> Result<(), ClientError> {
        self.ended.store(ended, Ordering::SeqCst);
        Ok(())
    }
}
