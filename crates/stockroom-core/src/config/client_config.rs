//! Client configuration model

use super::timeouts;
use crate::error::{ClientError, ClientResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Backend origin, e.g. `https://inventory.example.com`
    pub base_url: String,
    /// Authentication endpoints and refresh policy
    pub auth: AuthConfig,
    /// Timeout for a single request
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Timeout for establishing a connection
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
    /// Directory holding the persisted session (defaults to `~/.stockroom/session`)
    pub session_dir: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            auth: AuthConfig::default(),
            request_timeout: timeouts::network::request_timeout(),
            connect_timeout: timeouts::network::connect_timeout(),
            session_dir: None,
        }
    }
}

impl ClientConfig {
    /// Create a config pointing at the given backend
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set the refresh budget
    pub fn with_refresh_budget(mut self, budget: RefreshBudgetConfig) -> Self {
        self.auth.refresh_budget = budget;
        self
    }

    /// Set the session directory
    pub fn with_session_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.session_dir = Some(dir.into());
        self
    }

    /// Resolve a path (or absolute URL) against the backend origin
    pub fn endpoint_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        let base = self.base_url.trim_end_matches('/');
        if path.starts_with('/') {
            format!("{}{}", base, path)
        } else {
            format!("{}/{}", base, path)
        }
    }

    /// Check the configuration for values the client cannot work with
    pub fn validate(&self) -> ClientResult<()> {
        if self.base_url.trim().is_empty() {
            return Err(ClientError::config("base_url must not be empty"));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ClientError::config(format!(
                "base_url must start with http:// or https://, got '{}'",
                self.base_url
            )));
        }
        self.auth.validate()
    }
}

/// Authentication endpoints and retry policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub login_path: String,
    pub signup_path: String,
    pub refresh_path: String,
    /// Status code the backend uses for expired or invalid tokens
    pub auth_failure_status: u16,
    /// How many times one request may be resubmitted after an auth failure
    pub max_auth_retries: u32,
    pub refresh_budget: RefreshBudgetConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            login_path: "/api/auth/login".to_string(),
            signup_path: "/api/auth/signup".to_string(),
            refresh_path: "/api/auth/refresh-token".to_string(),
            auth_failure_status: 401,
            max_auth_retries: 1,
            refresh_budget: RefreshBudgetConfig::default(),
        }
    }
}

impl AuthConfig {
    fn validate(&self) -> ClientResult<()> {
        for (name, path) in [
            ("login_path", &self.login_path),
            ("signup_path", &self.signup_path),
            ("refresh_path", &self.refresh_path),
        ] {
            if !path.starts_with('/') {
                return Err(ClientError::config(format!(
                    "auth.{} must start with '/', got '{}'",
                    name, path
                )));
            }
        }
        if !(400..600).contains(&self.auth_failure_status) {
            return Err(ClientError::config(format!(
                "auth.auth_failure_status must be an error status, got {}",
                self.auth_failure_status
            )));
        }
        if self.max_auth_retries == 0 {
            return Err(ClientError::config("auth.max_auth_retries must be at least 1"));
        }
        if self.refresh_budget.enabled && self.refresh_budget.max_refreshes == 0 {
            return Err(ClientError::config(
                "auth.refresh_budget.max_refreshes must be at least 1 when enabled",
            ));
        }
        Ok(())
    }
}

/// Ceiling on refresh calls inside a sliding window
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshBudgetConfig {
    pub enabled: bool,
    pub max_refreshes: u32,
    #[serde(with = "humantime_serde")]
    pub window: Duration,
}

impl Default for RefreshBudgetConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_refreshes: timeouts::refresh::MAX_PER_WINDOW,
            window: timeouts::refresh::window(),
        }
    }
}

impl RefreshBudgetConfig {
    /// Create a budget of `max_refreshes` per `window`
    pub fn new(max_refreshes: u32, window: Duration) -> Self {
        Self {
            enabled: true,
            max_refreshes,
            window,
        }
    }

    /// Create a budget that never limits refreshes
    pub fn unlimited() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ClientConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.auth.auth_failure_status, 401);
        assert_eq!(config.auth.max_auth_retries, 1);
        assert_eq!(config.auth.refresh_path, "/api/auth/refresh-token");
    }

    #[test]
    fn test_endpoint_url() {
        let config = ClientConfig::new("https://inv.example.com/");
        assert_eq!(
            config.endpoint_url("/api/product/list"),
            "https://inv.example.com/api/product/list"
        );
        assert_eq!(
            config.endpoint_url("api/product/list"),
            "https://inv.example.com/api/product/list"
        );
        assert_eq!(
            config.endpoint_url("https://other.example.com/x"),
            "https://other.example.com/x"
        );
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = ClientConfig::new("");
        assert!(config.validate().is_err());

        config.base_url = "ftp://inv".to_string();
        assert!(config.validate().is_err());

        let mut config = ClientConfig::default();
        config.auth.refresh_path = "api/auth/refresh-token".to_string();
        assert!(config.validate().is_err());

        let mut config = ClientConfig::default();
        config.auth.max_auth_retries = 0;
        assert!(config.validate().is_err());

        let mut config = ClientConfig::default();
        config.auth.auth_failure_status = 200;
        assert!(config.validate().is_err());

        let config = ClientConfig::default()
            .with_refresh_budget(RefreshBudgetConfig::new(0, Duration::from_secs(10)));
        assert!(config.validate().is_err());

        let config = ClientConfig::default().with_refresh_budget(RefreshBudgetConfig {
            enabled: false,
            max_refreshes: 0,
            window: Duration::from_secs(10),
        });
        assert!(config.validate().is_ok());
    }
}
