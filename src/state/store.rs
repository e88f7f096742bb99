use std::path::PathBuf;

use super::StateSnapshot;

#[derive(Debug, thiserror::Error)]
pub enum DataAccessError {
    #[error("invalid session id '{0}': use letters, digits, '-' and '_'")]
    InvalidSessionId(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("state decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Persistence seam for session snapshots.
///
/// The engine never calls this; the caller loads a snapshot before running
/// commands and saves it when an execution reports itself dirty.
pub trait StateStore {
    /// Load the snapshot for `session_id`. A session that was never saved
    /// yields an empty snapshot.
    fn load(&self, session_id: &str) -> Result<StateSnapshot, DataAccessError>;

    fn save(&self, session_id: &str, snapshot: &StateSnapshot) -> Result<(), DataAccessError>;

    /// Forget a session. Returns whether anything was stored.
    fn remove(&self, session_id: &str) -> Result<bool, DataAccessError>;
}

/// Stores one JSON document per session under a root directory.
pub struct FileStateStore {
    root: PathBuf,
}

impl FileStateStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `$XDG_STATE_HOME/harbor`, falling back to `~/.local/state/harbor`.
    pub fn default_root() -> PathBuf {
        if let Some(dir) = std::env::var_os("XDG_STATE_HOME").filter(|d| !d.is_empty()) {
            return PathBuf::from(dir).join("harbor");
        }
        std::env::var_os("HOME")
            .filter(|h| !h.is_empty())
            .map(|h| PathBuf::from(h).join(".local").join("state").join("harbor"))
            .unwrap_or_else(|| PathBuf::from(".harbor"))
    }

    fn path_for(&self, session_id: &str) -> Result<PathBuf, DataAccessError> {
        let valid = !session_id.is_empty()
            && session_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'));
        if !valid {
            return Err(DataAccessError::InvalidSessionId(session_id.to_string()));
        }
        Ok(self.root.join(format!("{session_id}.json")))
    }
}

impl StateStore for FileStateStore {
    fn load(&self, session_id: &str) -> Result<StateSnapshot, DataAccessError> {
        let path = self.path_for(session_id)?;
        if !path.exists() {
            tracing::debug!(session = session_id, "no saved state, starting empty");
            return Ok(StateSnapshot::new());
        }
        let json = std::fs::read_to_string(&path)?;
        let snapshot = serde_json::from_str(&json)?;
        tracing::debug!(session = session_id, path = %path.display(), "loaded session state");
        Ok(snapshot)
    }

    fn save(&self, session_id: &str, snapshot: &StateSnapshot) -> Result<(), DataAccessError> {
        let path = self.path_for(session_id)?;
        std::fs::create_dir_all(&self.root)?;

        // Write then rename so a crash never leaves a truncated document.
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string_pretty(snapshot)?)?;
        std::fs::rename(&tmp, &path)?;
        tracing::debug!(session = session_id, path = %path.display(), "saved session state");
        Ok(())
    }

    fn remove(&self, session_id: &str) -> Result<bool, DataAccessError> {
        let path = self.path_for(session_id)?;
        match std::fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!(session = session_id, "removed session state");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
