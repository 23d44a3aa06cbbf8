//! Session persistence: a key-value store of [`ChatSession`]s keyed by id.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use log::{debug, warn};

use crate::error::{LegalChatError, Result};
use crate::types::ChatSession;

/// Storage capability the state manager persists through. Synchronous,
/// always-available semantics; one session per key.
pub trait SessionStore: Send {
    fn save(&self, session: &ChatSession) -> Result<()>;
    fn get(&self, id: &str) -> Result<Option<ChatSession>>;
    fn get_all(&self) -> Result<Vec<ChatSession>>;
    fn delete(&self, id: &str) -> Result<()>;
}

/// File-backed store: one JSON document per session under a directory.
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    /// Opens (and creates if needed) a store rooted at `dir`.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Opens the store at the platform data directory
    /// (e.g. `~/.local/share/legal-chat/sessions`).
    pub fn default_location() -> Result<Self> {
        let base = dirs::data_dir()
            .ok_or_else(|| LegalChatError::Store("Could not determine data directory".into()))?;
        Self::new(base.join("legal-chat").join("sessions"))
    }

    fn path_for(&self, id: &str) -> PathBuf {
        // Session ids are UUIDs; anything else is rejected before touching
        // the filesystem so an id can never escape the store directory.
        self.dir.join(format!("{}.json", id))
    }

    fn valid_id(id: &str) -> bool {
        !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }
}

impl SessionStore for FileSessionStore {
    fn save(&self, session: &ChatSession) -> Result<()> {
        if !Self::valid_id(&session.id) {
            return Err(LegalChatError::Store(format!(
                "Invalid session id: {:?}",
                session.id
            )));
        }
        let json = serde_json::to_string_pretty(session)?;
        fs::write(self.path_for(&session.id), json)?;
        debug!("Saved session {} to store", session.id);
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<ChatSession>> {
        if !Self::valid_id(id) {
            return Ok(None);
        }
        let path = self.path_for(id);
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&json)?))
    }

    fn get_all(&self) -> Result<Vec<ChatSession>> {
        let mut sessions = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let json = fs::read_to_string(&path)?;
            match serde_json::from_str::<ChatSession>(&json) {
                Ok(session) => sessions.push(session),
                // A corrupt file should not take every other session down.
                Err(e) => warn!("Skipping unreadable session file {:?}: {}", path, e),
            }
        }
        Ok(sessions)
    }

    fn delete(&self, id: &str) -> Result<()> {
        if !Self::valid_id(id) {
            return Ok(());
        }
        let path = self.path_for(id);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

/// In-memory store for tests and embedders that do not want disk state.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<String, ChatSession>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn save(&self, session: &ChatSession) -> Result<()> {
        self.sessions
            .lock()
            .map_err(|e| LegalChatError::Store(e.to_string()))?
            .insert(session.id.clone(), session.clone());
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<ChatSession>> {
        Ok(self
            .sessions
            .lock()
            .map_err(|e| LegalChatError::Store(e.to_string()))?
            .get(id)
            .cloned())
    }

    fn get_all(&self) -> Result<Vec<ChatSession>> {
        Ok(self
            .sessions
            .lock()
            .map_err(|e| LegalChatError::Store(e.to_string()))?
            .values()
            .cloned()
            .collect())
    }

    fn delete(&self, id: &str) -> Result<()> {
        self.sessions
            .lock()
            .map_err(|e| LegalChatError::Store(e.to_string()))?
            .remove(id);
        Ok(())
    }
}
