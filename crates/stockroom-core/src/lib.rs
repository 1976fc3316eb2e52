//! Stockroom Core Library
//!
//! This crate provides the authenticated HTTP client for the Stockroom
//! inventory backend: session storage, bearer token attachment, and
//! transparent recovery from expired access tokens through a single shared
//! refresh.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod session;

// Re-export commonly used types
pub use auth::{
    AuthInterceptor, BroadcastRedirect, HttpTokenRefresher, LogRedirect, LoginRedirect,
    RefreshFailure, RefreshOutcome, TokenRefresher,
};
pub use client::{ApiClient, ApiClientBuilder, AuthResponse, LoginRequest, PendingRequest, SignupRequest};
pub use crate::config::{AuthConfig, ClientConfig, RefreshBudgetConfig, load_config};
pub use error::{ClientError, ClientResult, TerminalReason};
pub use reqwest::{Method, StatusCode};
pub use session::{
    FileSessionStore, MemorySessionStore, Session, SessionCookieJar, SessionError, SessionStore,
    UserProfile,
};
