use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// What gets written to disk. Only the raw token is trusted on reload; everything else in
/// the session is decoded from it again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSession {
    pub token: String,
    pub saved_at: DateTime<Utc>,
}

/// Durable home of the session token.
pub trait TokenStorage: Send + Sync {
    fn load(&self) -> Result<Option<String>>;
    fn save(&self, token: &str) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

pub struct SessionStorage {
    path: PathBuf,
}

impl SessionStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config dir>/ntrovote/session.json`
    pub fn default_location() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(Self::new(config_dir.join("ntrovote").join("session.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStorage for SessionStorage {
    fn load(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let session_data = fs::read_to_string(&self.path)?;
        let stored_session: StoredSession = serde_json::from_str(&session_data)?;
        log::info!("Session loaded (saved {})", stored_session.saved_at);
        Ok(Some(stored_session.token))
    }

    fn save(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let stored_session = StoredSession {
            token: token.to_string(),
            saved_at: Utc::now(),
        };
        fs::write(&self.path, serde_json::to_string_pretty(&stored_session)?)?;
        log::info!("Session saved successfully");
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
            log::info!("Session cleared successfully");
        }
        Ok(())
    }
}

/// Keeps the token for the lifetime of the process only.
#[derive(Default)]
pub struct MemoryStorage {
    token: Mutex<Option<String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.token.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl TokenStorage for MemoryStorage {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.slot().clone())
    }

    fn save(&self, token: &str) -> Result<()> {
        *self.slot() = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.slot() = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_file() -> PathBuf {
        std::env::temp_dir()
            .join(format!("ntrovote-test-{}", uuid::Uuid::new_v4()))
            .join("session.json")
    }

    #[test]
    fn file_storage_round_trips_and_clears() {
        let storage = SessionStorage::new(scratch_file());
        assert_eq!(storage.load().unwrap(), None);

        storage.save("a.b.c").unwrap();
        assert_eq!(storage.load().unwrap().as_deref(), Some("a.b.c"));

        storage.clear().unwrap();
        assert_eq!(storage.load().unwrap(), None);
        // Clearing twice is fine.
        storage.clear().unwrap();

        let _ = fs::remove_dir_all(storage.path().parent().unwrap());
    }

    #[test]
    fn corrupted_file_is_an_error_not_a_panic() {
        let storage = SessionStorage::new(scratch_file());
        fs::create_dir_all(storage.path().parent().unwrap()).unwrap();
        fs::write(storage.path(), "{ not json").unwrap();

        assert!(storage.load().is_err());

        let _ = fs::remove_dir_all(storage.path().parent().unwrap());
    }
}
