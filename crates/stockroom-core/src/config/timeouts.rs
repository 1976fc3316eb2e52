//! Centralized timeout configuration
//!
//! Default timeout values for network operations. All of them can be
//! overridden through [`ClientConfig`](super::ClientConfig).

use std::time::Duration;

/// Default timeout values for backend calls
pub mod network {
    use super::*;

    /// Default timeout for a single request (30 seconds)
    pub const REQUEST_SECS: u64 = 30;

    /// Default connection timeout (10 seconds)
    pub const CONNECT_SECS: u64 = 10;

    /// Get request timeout as Duration
    pub fn request_timeout() -> Duration {
        Duration::from_secs(REQUEST_SECS)
    }

    /// Get connection timeout as Duration
    pub fn connect_timeout() -> Duration {
        Duration::from_secs(CONNECT_SECS)
    }
}

/// Default values for the token-refresh ceiling
pub mod refresh {
    use super::*;

    /// Refreshes allowed inside one window
    pub const MAX_PER_WINDOW: u32 = 3;

    /// Length of the refresh window (60 seconds)
    pub const WINDOW_SECS: u64 = 60;

    /// Get the refresh window as Duration
    pub fn window() -> Duration {
        Duration::from_secs(WINDOW_SECS)
    }
}
