//! Session token storage.
//!
//! [`SessionStore`] keeps the current token and user in memory and mirrors
//! the token into a [`TokenStore`] backend. The file backend writes
//! `<base>/credentials.json` with restricted permissions (0600).
//! Tokens are never logged or displayed in full.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::api::{BearerToken, User};
use crate::config::paths;

/// Persistence slot for the bearer token.
pub trait TokenStore {
    /// Returns the persisted token, if any.
    ///
    /// # Errors
    /// Returns an error if the slot exists but cannot be read.
    fn load(&self) -> Result<Option<String>>;

    /// Overwrites the slot with `token`.
    ///
    /// # Errors
    /// Returns an error if the slot cannot be written.
    fn save(&self, token: &str) -> Result<()>;

    /// Empties the slot. Clearing an empty slot succeeds.
    ///
    /// # Errors
    /// Returns an error if the slot cannot be removed.
    fn clear(&self) -> Result<()>;
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedCredentials {
    token: String,
}

/// Token slot backed by a JSON file.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Uses `credentials.json` inside MYTODO_HOME.
    pub fn in_home() -> Self {
        Self::new(paths::credentials_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<String>> {
        let path = &self.path;
        if !path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read credentials from {}", path.display()))?;

        let persisted: PersistedCredentials = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse credentials from {}", path.display()))?;

        let token = persisted.token.trim();
        Ok((!token.is_empty()).then(|| token.to_string()))
    }

    fn save(&self, token: &str) -> Result<()> {
        let path = &self.path;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let contents = serde_json::to_string_pretty(&PersistedCredentials {
            token: token.to_string(),
        })
        .context("Failed to serialize credentials")?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(path)
                .with_context(|| format!("Failed to open {} for writing", path.display()))?;
            // mode() only applies on creation
            file.set_permissions(fs::Permissions::from_mode(0o600))
                .with_context(|| {
                    format!("Failed to restrict permissions on {}", path.display())
                })?;
            file.write_all(contents.as_bytes())
                .with_context(|| format!("Failed to write to {}", path.display()))?;
        }

        #[cfg(not(unix))]
        {
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(path)
                .with_context(|| format!("Failed to open {} for writing", path.display()))?;
            file.write_all(contents.as_bytes())
                .with_context(|| format!("Failed to write to {}", path.display()))?;
        }

        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to remove {}", self.path.display())),
        }
    }
}

/// In-memory token slot for tests and ephemeral sessions.
///
/// Clones share the same slot.
#[derive(Clone, Debug, Default)]
pub struct MemoryTokenStore {
    slot: Arc<Mutex<Option<String>>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(token.to_string()))),
        }
    }

    /// Returns the raw slot content.
    pub fn peek(&self) -> Option<String> {
        self.slot.lock().ok().and_then(|slot| slot.clone())
    }

    fn with_slot<T>(&self, f: impl FnOnce(&mut Option<String>) -> T) -> Result<T> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| anyhow!("token slot lock poisoned"))?;
        Ok(f(&mut slot))
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>> {
        self.with_slot(|slot| slot.clone().filter(|t| !t.trim().is_empty()))
    }

    fn save(&self, token: &str) -> Result<()> {
        self.with_slot(|slot| *slot = Some(token.to_string()))
    }

    fn clear(&self) -> Result<()> {
        self.with_slot(|slot| *slot = None)
    }
}

/// Current token and user, with the token mirrored to a [`TokenStore`].
///
/// A user is only ever held alongside a token.
#[derive(Debug)]
pub struct SessionStore<S> {
    backend: S,
    token: Option<BearerToken>,
    user: Option<User>,
}

impl<S: TokenStore> SessionStore<S> {
    pub fn new(backend: S) -> Self {
        Self {
            backend,
            token: None,
            user: None,
        }
    }

    /// Reads the persisted slot without touching in-memory state.
    ///
    /// # Errors
    /// Returns an error if the backend cannot be read.
    pub fn load_persisted(&self) -> Result<Option<BearerToken>> {
        Ok(self.backend.load()?.and_then(BearerToken::new))
    }

    /// Stores `token` in the backend, then in memory. Overwrites any prior value.
    ///
    /// # Errors
    /// Returns an error if the backend write fails; memory is left unchanged.
    pub fn set_token(&mut self, token: BearerToken) -> Result<()> {
        self.backend.save(token.as_str())?;
        if self.token.as_ref() != Some(&token) {
            self.user = None;
        }
        self.token = Some(token);
        Ok(())
    }

    /// Loads an already-persisted token into memory only.
    pub(crate) fn restore_token(&mut self, token: BearerToken) {
        self.token = Some(token);
        self.user = None;
    }

    /// Removes the token (and the user) from memory and from the backend.
    ///
    /// # Errors
    /// Returns an error if the backend cannot be cleared; memory is cleared regardless.
    pub fn clear_token(&mut self) -> Result<()> {
        self.token = None;
        self.user = None;
        self.backend.clear()
    }

    pub fn token(&self) -> Option<&BearerToken> {
        self.token.as_ref()
    }

    /// Stores the user for the current token. Ignored when no token is held.
    pub fn set_user(&mut self, user: User) {
        if self.token.is_some() {
            self.user = Some(user);
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;

    use super::*;

    fn user() -> User {
        let ts = Utc.with_ymd_and_hms(2025, 7, 1, 10, 0, 0).unwrap();
        User {
            id: "u1".to_string(),
            email: "alice@example.com".to_string(),
            created_at: ts,
            updated_at: ts,
        }
    }

    fn token(value: &str) -> BearerToken {
        BearerToken::new(value).unwrap()
    }

    #[test]
    fn test_file_store_round_trip_and_clear() {
        let dir = tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("nested").join("credentials.json"));

        assert_eq!(store.load().unwrap(), None);

        store.save("tok-1").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("tok-1"));

        store.save("tok-2").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("tok-2"));

        store.clear().unwrap();
        assert!(!store.path().exists());
        assert_eq!(store.load().unwrap(), None);

        // clearing twice is fine
        store.clear().unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_file_store_restricts_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("credentials.json"));
        store.save("tok").unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn test_file_store_tightens_existing_file() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        fs::write(&path, r#"{"token": "old"}"#).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        let store = FileTokenStore::new(&path);
        store.save("new").unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(store.load().unwrap().as_deref(), Some("new"));
    }

    #[test]
    fn test_file_store_blank_token_reads_as_absent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        fs::write(&path, r#"{"token": "  "}"#).unwrap();

        assert_eq!(FileTokenStore::new(path).load().unwrap(), None);
    }

    #[test]
    fn test_file_store_reports_corrupt_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        fs::write(&path, "not json").unwrap();

        let err = FileTokenStore::new(path).load().unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse credentials"));
    }

    #[test]
    fn test_memory_store_clones_share_slot() {
        let store = MemoryTokenStore::new();
        let observer = store.clone();

        store.save("abc").unwrap();
        assert_eq!(observer.peek().as_deref(), Some("abc"));

        store.clear().unwrap();
        assert_eq!(observer.peek(), None);
    }

    #[test]
    fn test_set_token_persists_and_clear_removes_everything() {
        let backend = MemoryTokenStore::new();
        let mut session = SessionStore::new(backend.clone());

        session.set_token(token("tok")).unwrap();
        session.set_user(user());
        assert_eq!(session.token().map(BearerToken::as_str), Some("tok"));
        assert_eq!(backend.peek().as_deref(), Some("tok"));
        assert!(session.user().is_some());

        session.clear_token().unwrap();
        assert!(session.token().is_none());
        assert!(session.user().is_none());
        assert_eq!(backend.peek(), None);
    }

    #[test]
    fn test_user_requires_token() {
        let mut session = SessionStore::new(MemoryTokenStore::new());
        session.set_user(user());
        assert!(session.user().is_none());
    }

    #[test]
    fn test_new_token_drops_previous_user() {
        let mut session = SessionStore::new(MemoryTokenStore::new());
        session.set_token(token("first")).unwrap();
        session.set_user(user());

        session.set_token(token("second")).unwrap();
        assert!(session.user().is_none());
    }

    #[test]
    fn test_load_persisted_does_not_touch_memory() {
        let session = SessionStore::new(MemoryTokenStore::with_token("saved"));
        let loaded = session.load_persisted().unwrap();
        assert_eq!(loaded.as_ref().map(BearerToken::as_str), Some("saved"));
        assert!(session.token().is_none());
    }
}
