//! Login redirect hook
//!
//! Navigation belongs to the host (UI, CLI). The interceptor only reports
//! that the session ended and why.

use crate::error::TerminalReason;
use tokio::sync::broadcast;
use tracing::info;

/// Called once per terminal auth failure, after the session was cleared
#[cfg_attr(test, mockall::automock)]
pub trait LoginRedirect: Send + Sync {
    fn redirect_to_login(&self, reason: &TerminalReason);
}

/// Redirect hook that only logs
#[derive(Debug, Default, Clone, Copy)]
pub struct LogRedirect;

impl LoginRedirect for LogRedirect {
    fn redirect_to_login(&self, reason: &TerminalReason) {
        info!(%reason, "Session ended, login required");
    }
}

/// Redirect hook that publishes terminal failures to subscribers
#[derive(Debug, Clone)]
pub struct BroadcastRedirect {
    sender: broadcast::Sender<TerminalReason>,
}

impl BroadcastRedirect {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TerminalReason> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastRedirect {
    fn default() -> Self {
        Self::new(16)
    }
}

impl LoginRedirect for BroadcastRedirect {
    fn redirect_to_login(&self, reason: &TerminalReason) {
        // no subscribers is fine
        let _ = self.sender.send(reason.clone());
    }
}
