//! Client session: access token, user profile and refresh cookie
//!
//! Provides:
//! - [`SessionStore`] with in-memory and file-backed implementations
//! - [`SessionCookieJar`] for the HTTP-only refresh cookie

mod cookies;
mod store;
mod types;

pub use cookies::SessionCookieJar;
pub use store::{FileSessionStore, MemorySessionStore, SessionError, SessionStore};
pub use types::{Session, UserProfile};
