//! Access token refresh
//!
//! Exchanges the HTTP-only refresh cookie for a new access token. Every
//! failure is reported as a [`RefreshOutcome::Failed`] value; this module
//! never errors, panics or redirects.

use crate::session::SessionStore;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// Result of one refresh call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// New access token, already written to the session store
    Refreshed(String),
    Failed(RefreshFailure),
}

/// Why a refresh did not produce a token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshFailure {
    /// No response from the refresh endpoint
    Network(String),
    /// The refresh endpoint answered with the auth failure status
    Unauthorized,
    /// Any other non-success status
    Status(u16),
    /// 2xx with `success: false`, a missing token or an unreadable body
    Unsuccessful(String),
    /// The new token could not be stored
    Storage(String),
    /// The refresh budget for the current window is spent
    BudgetExceeded,
}

impl std::fmt::Display for RefreshFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Network(e) => write!(f, "network error: {}", e),
            Self::Unauthorized => write!(f, "refresh credentials rejected"),
            Self::Status(status) => write!(f, "refresh endpoint returned status {}", status),
            Self::Unsuccessful(message) => write!(f, "{}", message),
            Self::Storage(e) => write!(f, "could not store token: {}", e),
            Self::BudgetExceeded => write!(f, "refresh budget exhausted"),
        }
    }
}

/// Something that can obtain a new access token
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh(&self) -> RefreshOutcome;
}

/// Refresh endpoint response body
#[derive(Debug, Deserialize)]
struct RefreshResponse {
    #[serde(default)]
    success: bool,
    #[serde(rename = "accessToken", default)]
    access_token: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Refresher calling `POST <refresh_url>` with cookie credentials
pub struct HttpTokenRefresher {
    http_client: reqwest::Client,
    refresh_url: String,
    auth_failure_status: u16,
    store: Arc<dyn SessionStore>,
}

impl HttpTokenRefresher {
    /// `http_client` must share the cookie store holding the refresh cookie
    pub fn new(
        http_client: reqwest::Client,
        refresh_url: impl Into<String>,
        auth_failure_status: u16,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            http_client,
            refresh_url: refresh_url.into(),
            auth_failure_status,
            store,
        }
    }

    async fn call(&self) -> Result<String, RefreshFailure> {
        let response = self
            .http_client
            .post(&self.refresh_url)
            .send()
            .await
            .map_err(|e| RefreshFailure::Network(e.to_string()))?;

        let status = response.status();
        if status.as_u16() == self.auth_failure_status {
            return Err(RefreshFailure::Unauthorized);
        }
        if !status.is_success() {
            return Err(RefreshFailure::Status(status.as_u16()));
        }

        let body: RefreshResponse = response
            .json()
            .await
            .map_err(|e| RefreshFailure::Unsuccessful(format!("unreadable response: {}", e)))?;

        if !body.success {
            return Err(RefreshFailure::Unsuccessful(
                body.message
                    .unwrap_or_else(|| "refresh endpoint reported failure".to_string()),
            ));
        }

        body.access_token
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| RefreshFailure::Unsuccessful("response carried no access token".into()))
    }
}

#[async_trait]
impl TokenRefresher for HttpTokenRefresher {
    async fn refresh(&self) -> RefreshOutcome {
        debug!(url = %self.refresh_url, "Refreshing access token");

        let token = match self.call().await {
            Ok(token) => token,
            Err(failure) => {
                warn!(%failure, "Token refresh failed");
                return RefreshOutcome::Failed(failure);
            }
        };

        if let Err(e) = self.store.set_token(&token) {
            warn!("Refreshed token could not be stored: {}", e);
            return RefreshOutcome::Failed(RefreshFailure::Storage(e.to_string()));
        }

        debug!("Access token refreshed");
        RefreshOutcome::Refreshed(token)
    }
}
