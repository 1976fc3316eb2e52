//! Session storage
//!
//! The access token and user profile live behind [`SessionStore`] so the
//! interceptor never touches ambient storage directly.

use super::types::{Session, UserProfile};
use parking_lot::RwLock;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

const TOKEN_FILE: &str = "token";
const USER_FILE: &str = "user.json";

/// Session storage errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum SessionError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Storage error: {0}")]
    StorageError(String),
}

/// Storage interface for the client session
pub trait SessionStore: Send + Sync {
    /// Current access token
    fn token(&self) -> Result<Option<String>, SessionError>;

    /// Replace the access token
    fn set_token(&self, token: &str) -> Result<(), SessionError>;

    /// Stored user profile
    fn user(&self) -> Result<Option<UserProfile>, SessionError>;

    /// Replace the user profile
    fn set_user(&self, user: &UserProfile) -> Result<(), SessionError>;

    /// Delete token and user
    fn clear(&self) -> Result<(), SessionError>;

    /// Read token and user together
    fn load(&self) -> Result<Session, SessionError> {
        Ok(Session {
            access_token: self.token()?,
            user: self.user()?,
        })
    }
}

/// In-memory session storage
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    session: RwLock<Session>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds a token
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            session: RwLock::new(Session {
                access_token: Some(token.into()),
                user: None,
            }),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn token(&self) -> Result<Option<String>, SessionError> {
        Ok(self.session.read().access_token.clone())
    }

    fn set_token(&self, token: &str) -> Result<(), SessionError> {
        self.session.write().access_token = Some(token.to_string());
        Ok(())
    }

    fn user(&self) -> Result<Option<UserProfile>, SessionError> {
        Ok(self.session.read().user.clone())
    }

    fn set_user(&self, user: &UserProfile) -> Result<(), SessionError> {
        self.session.write().user = Some(user.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        *self.session.write() = Session::default();
        Ok(())
    }
}

/// File-based session storage
///
/// Layout: `<dir>/token` (plain text) and `<dir>/user.json`.
pub struct FileSessionStore {
    base_path: PathBuf,
}

impl FileSessionStore {
    /// Create new file-based storage
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Default storage location, `~/.stockroom/session`
    pub fn default_location() -> Result<Self, SessionError> {
        let home = dirs::home_dir()
            .ok_or_else(|| SessionError::StorageError("Cannot find home directory".into()))?;
        let path = home.join(".stockroom/session");
        ensure_private_dir(&path)?;
        Ok(Self::new(path))
    }

    /// Directory holding the session files
    pub fn path(&self) -> &Path {
        &self.base_path
    }

    fn write_private(&self, name: &str, content: &str) -> Result<(), SessionError> {
        ensure_private_dir(&self.base_path)?;
        write_private_file(&self.base_path.join(name), content.as_bytes())
    }

    fn read(&self, name: &str) -> Result<Option<String>, SessionError> {
        let path = self.base_path.join(name);
        if !path.exists() {
            return Ok(None);
        }
        std::fs::read_to_string(&path)
            .map(Some)
            .map_err(|e| SessionError::IoError(e.to_string()))
    }

    fn remove(&self, name: &str) -> Result<(), SessionError> {
        let path = self.base_path.join(name);
        if path.exists() {
            std::fs::remove_file(&path).map_err(|e| SessionError::IoError(e.to_string()))?;
        }
        Ok(())
    }
}

impl SessionStore for FileSessionStore {
    fn token(&self) -> Result<Option<String>, SessionError> {
        Ok(self
            .read(TOKEN_FILE)?
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty()))
    }

    fn set_token(&self, token: &str) -> Result<(), SessionError> {
        self.write_private(TOKEN_FILE, token)
    }

    fn user(&self) -> Result<Option<UserProfile>, SessionError> {
        match self.read(USER_FILE)? {
            Some(content) => serde_json::from_str(&content)
                .map(Some)
                .map_err(|e| SessionError::SerializationError(e.to_string())),
            None => Ok(None),
        }
    }

    fn set_user(&self, user: &UserProfile) -> Result<(), SessionError> {
        let content = serde_json::to_string_pretty(user)
            .map_err(|e| SessionError::SerializationError(e.to_string()))?;
        self.write_private(USER_FILE, &content)
    }

    fn clear(&self) -> Result<(), SessionError> {
        self.remove(TOKEN_FILE)?;
        self.remove(USER_FILE)
    }
}

/// Replace `path` with `content` through a fresh owner-only file
///
/// The data goes to `<path>.tmp`, created with mode `0600`, which is then
/// renamed over `path`. Readers never see a partial file and the content is
/// never readable by other users.
pub(crate) fn write_private_file(path: &Path, content: &[u8]) -> Result<(), SessionError> {
    let io_error = |e: std::io::Error| SessionError::IoError(e.to_string());

    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        ensure_private_dir(dir)?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    match std::fs::remove_file(&tmp) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => return Err(io_error(e)),
        _ => {}
    }

    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(&tmp).map_err(io_error)?;
    file.write_all(content).map_err(io_error)?;
    file.sync_all().map_err(io_error)?;
    std::fs::rename(&tmp, path).map_err(io_error)
}

/// Create `path` (recursively) readable only by the current user
pub(crate) fn ensure_private_dir(path: &Path) -> Result<(), SessionError> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::{DirBuilderExt, PermissionsExt};

        if !path.exists() {
            let mut builder = std::fs::DirBuilder::new();
            builder.recursive(true).mode(0o700);
            builder
                .create(path)
                .map_err(|e| SessionError::IoError(e.to_string()))?;
        }

        let metadata = std::fs::metadata(path).map_err(|e| SessionError::IoError(e.to_string()))?;
        let mode = metadata.permissions().mode() & 0o777;
        if mode != 0o700 {
            tracing::warn!(
                "Session directory has insecure permissions: {:o}. Expected 0700. Attempting to fix...",
                mode
            );
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700)).map_err(
                |e| {
                    SessionError::IoError(format!(
                        "Failed to set secure permissions on session directory: {}",
                        e
                    ))
                },
            )?;
        }
    }

    #[cfg(not(unix))]
    {
        std::fs::create_dir_all(path).map_err(|e| SessionError::IoError(e.to_string()))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_user() -> UserProfile {
        UserProfile {
            id: "u-1".to_string(),
            name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
            role: "manager".to_string(),
            company_name: Some("Acme Foods".to_string()),
            company_id: Some("c-17".to_string()),
            phone: None,
        }
    }

    #[test]
    fn test_memory_store() {
        let store = MemorySessionStore::with_token("A");
        assert_eq!(store.token().unwrap().as_deref(), Some("A"));

        store.set_token("B").unwrap();
        store.set_user(&sample_user()).unwrap();
        let session = store.load().unwrap();
        assert_eq!(session.access_token.as_deref(), Some("B"));
        assert_eq!(session.user.unwrap().name, "Asha");

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), Session::default());
    }

    #[test]
    fn test_file_store() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSessionStore::new(temp_dir.path().join("session"));

        assert!(store.token().unwrap().is_none());
        assert!(store.user().unwrap().is_none());

        store.set_token("token-A").unwrap();
        store.set_user(&sample_user()).unwrap();

        // A second handle over the same directory sees the same session
        let reopened = FileSessionStore::new(store.path());
        assert_eq!(reopened.token().unwrap().as_deref(), Some("token-A"));
        assert_eq!(reopened.user().unwrap(), Some(sample_user()));

        store.clear().unwrap();
        assert!(reopened.token().unwrap().is_none());
        assert!(reopened.user().unwrap().is_none());

        // Clearing twice is fine
        store.clear().unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_file_store_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let store = FileSessionStore::new(temp_dir.path().join("session"));
        store.set_token("secret").unwrap();

        let dir_mode = std::fs::metadata(store.path()).unwrap().permissions().mode() & 0o777;
        let file_mode = std::fs::metadata(store.path().join(TOKEN_FILE))
            .unwrap()
            .permissions()
            .mode()
            & 0o777;
        assert_eq!(dir_mode, 0o700);
        assert_eq!(file_mode, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn test_token_replaces_loose_files() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let store = FileSessionStore::new(temp_dir.path().join("session"));
        ensure_private_dir(store.path()).unwrap();

        // left behind world-readable, e.g. by an older version or a crash
        let token_path = store.path().join(TOKEN_FILE);
        let tmp_path = store.path().join("token.tmp");
        for path in [&token_path, &tmp_path] {
            std::fs::write(path, "old").unwrap();
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o644)).unwrap();
        }

        store.set_token("secret").unwrap();

        let mode = std::fs::metadata(&token_path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
        assert!(!tmp_path.exists());
        assert_eq!(store.token().unwrap().as_deref(), Some("secret"));
    }

    #[test]
    fn test_corrupt_user_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSessionStore::new(temp_dir.path());
        std::fs::write(temp_dir.path().join(USER_FILE), "{not json").unwrap();
        assert!(matches!(
            store.user(),
            Err(SessionError::SerializationError(_))
        ));
    }
}
