//! Persistent cookie jar
//!
//! The refresh token is an HTTP-only cookie. A browser keeps it across
//! reloads on its own; a CLI process has to persist it itself, otherwise the
//! refresh call after a restart carries no credentials.

use super::store::{SessionError, write_private_file};
use reqwest::Url;
use reqwest::cookie::CookieStore;
use reqwest::header::HeaderValue;
use reqwest_cookie_store::CookieStoreMutex;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::{MutexGuard, PoisonError};
use tracing::{debug, warn};

const COOKIE_FILE: &str = "cookies.json";

/// RFC 6265 cookie jar with optional `cookies.json` persistence
///
/// Matching (domain, path, `Secure`, expiry) is done by `cookie_store`.
/// Session cookies are persisted too: the backend issues the refresh cookie
/// without `Expires`.
pub struct SessionCookieJar {
    store: CookieStoreMutex,
    path: Option<PathBuf>,
    persist_lock: parking_lot::Mutex<()>,
}

impl std::fmt::Debug for SessionCookieJar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCookieJar")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl Default for SessionCookieJar {
    fn default() -> Self {
        Self::with_store(cookie_store::CookieStore::new(), None)
    }
}

impl SessionCookieJar {
    /// Create an in-memory jar
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a jar persisted to `<dir>/cookies.json`, loading what is already there
    ///
    /// An unreadable file is logged and replaced by an empty jar on the next
    /// write; losing the cookie only costs a new login.
    pub fn persistent(dir: impl Into<PathBuf>) -> Self {
        let path = dir.into().join(COOKIE_FILE);
        let store = load(&path).unwrap_or_else(|e| {
            warn!(path = %path.display(), "Ignoring unreadable cookie file: {}", e);
            cookie_store::CookieStore::new()
        });
        Self::with_store(store, Some(path))
    }

    fn with_store(store: cookie_store::CookieStore, path: Option<PathBuf>) -> Self {
        Self {
            store: CookieStoreMutex::new(store),
            path,
            persist_lock: parking_lot::Mutex::new(()),
        }
    }

    /// Value of the cookie `name` that would be sent to `url`
    pub fn value(&self, url: &Url, name: &str) -> Option<String> {
        self.lock()
            .get_request_values(url)
            .find(|(cookie, _)| *cookie == name)
            .map(|(_, value)| value.to_string())
    }

    /// Drop every cookie
    pub fn clear(&self) -> Result<(), SessionError> {
        self.lock().clear();
        self.persist()
    }

    fn lock(&self) -> MutexGuard<'_, cookie_store::CookieStore> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self) -> Result<(), SessionError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        // one writer at a time, so the last snapshot taken is the last one written
        let _writing = self.persist_lock.lock();
        let mut content = Vec::new();
        cookie_store::serde::json::save_incl_expired_and_nonpersistent(&self.lock(), &mut content)
            .map_err(|e| SessionError::SerializationError(e.to_string()))?;
        write_private_file(path, &content)
    }
}

fn load(path: &Path) -> Result<cookie_store::CookieStore, SessionError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(cookie_store::CookieStore::new());
        }
        Err(e) => return Err(SessionError::IoError(e.to_string())),
    };
    cookie_store::serde::json::load(BufReader::new(file))
        .map_err(|e| SessionError::SerializationError(e.to_string()))
}

impl CookieStore for SessionCookieJar {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        let mut headers = cookie_headers.peekable();
        if headers.peek().is_none() {
            return;
        }

        debug!(url = %url, "Storing cookies");
        self.store.set_cookies(&mut headers, url);

        if let Err(e) = self.persist() {
            warn!("Failed to persist cookies: {}", e);
        }
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        self.store.cookies(url)
    }
}
