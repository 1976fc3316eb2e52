//! Authentication interceptor
//!
//! Stamps every outgoing request with the current access token and recovers
//! from one expired-token cycle:
//!
//! 1. a response with the auth failure status marks the request as retried,
//! 2. the request joins (or starts) the single in-flight refresh,
//! 3. on success the request is sent again with the new token,
//! 4. on failure the session is cleared, the login redirect fires and the
//!    caller receives [`ClientError::AuthExpired`].
//!
//! A request is never resubmitted more than `max_auth_retries` times, and a
//! failing refresh call is never itself refreshed.

use super::bearer::{bearer_header, normalize_token};
use super::budget::RefreshBudget;
use super::redirect::LoginRedirect;
use super::refresh::{RefreshFailure, RefreshOutcome, TokenRefresher};
use super::single_flight::RefreshCoordinator;
use crate::client::PendingRequest;
use crate::config::AuthConfig;
use crate::error::{ClientError, ClientResult, TerminalReason};
use crate::session::SessionStore;
use futures::FutureExt;
use reqwest::Response;
use reqwest::header::AUTHORIZATION;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Longest backend error body copied into an error message
const MAX_ERROR_BODY: usize = 512;

/// Clears the session and fires the redirect hook
#[derive(Clone)]
struct SessionExpiry {
    store: Arc<dyn SessionStore>,
    redirect: Arc<dyn LoginRedirect>,
}

impl SessionExpiry {
    fn expire(&self, reason: &TerminalReason) {
        warn!(%reason, "Terminal auth failure, clearing session");
        if let Err(e) = self.store.clear() {
            warn!("Failed to clear session: {}", e);
        }
        self.redirect.redirect_to_login(reason);
    }
}

/// Map a refresh failure onto the terminal reason reported to callers
fn terminal_reason(failure: &RefreshFailure) -> TerminalReason {
    match failure {
        RefreshFailure::Unauthorized => TerminalReason::RefreshEndpointRejected,
        RefreshFailure::BudgetExceeded => TerminalReason::RefreshBudgetExceeded,
        other => TerminalReason::RefreshFailed(other.to_string()),
    }
}

/// Request interceptor owning the refresh protocol
pub struct AuthInterceptor {
    http_client: reqwest::Client,
    auth_failure_status: u16,
    max_auth_retries: u32,
    refresh_path: String,
    store: Arc<dyn SessionStore>,
    refresher: Arc<dyn TokenRefresher>,
    budget: Arc<RefreshBudget>,
    coordinator: RefreshCoordinator,
    expiry: SessionExpiry,
}

impl AuthInterceptor {
    pub fn new(
        http_client: reqwest::Client,
        config: &AuthConfig,
        store: Arc<dyn SessionStore>,
        refresher: Arc<dyn TokenRefresher>,
        redirect: Arc<dyn LoginRedirect>,
    ) -> Self {
        Self {
            http_client,
            auth_failure_status: config.auth_failure_status,
            max_auth_retries: config.max_auth_retries,
            refresh_path: config.refresh_path.clone(),
            store: store.clone(),
            refresher,
            budget: Arc::new(RefreshBudget::new(config.refresh_budget.clone())),
            coordinator: RefreshCoordinator::new(),
            expiry: SessionExpiry { store, redirect },
        }
    }

    /// Current token, normalized; storage errors read as "no token"
    pub fn current_token(&self) -> Option<String> {
        match self.store.token() {
            Ok(token) => token.as_deref().and_then(normalize_token).map(str::to_string),
            Err(e) => {
                warn!("Failed to read access token: {}", e);
                None
            }
        }
    }

    /// Set `Authorization: Bearer <token>` when a token is stored
    ///
    /// Without a token the request is left as it is. Returns the attached token.
    pub fn attach_token(&self, request: &mut PendingRequest) -> Option<String> {
        let attached = self.current_token().and_then(|token| match bearer_header(&token) {
            Ok(value) => {
                request.headers_mut().insert(AUTHORIZATION, value);
                Some(token)
            }
            Err(_) => {
                warn!("Stored access token is not a valid header value, sending without it");
                None
            }
        });
        request.set_sent_token(attached.clone());
        attached
    }

    /// Attach the token, send, and run the response through [`handle_response`](Self::handle_response)
    pub async fn execute(&self, mut request: PendingRequest) -> ClientResult<Response> {
        self.attach_token(&mut request);
        let outcome = self.dispatch(&request).await;
        self.handle_response(request, outcome).await
    }

    /// Pass successes through, recover from auth failures, reject everything else
    pub async fn handle_response(
        &self,
        mut request: PendingRequest,
        outcome: Result<Response, reqwest::Error>,
    ) -> ClientResult<Response> {
        let mut outcome = outcome;
        loop {
            let response = outcome.map_err(|e| {
                debug!(url = %request.url(), "Request failed without a response: {}", e);
                ClientError::from(e)
            })?;

            let status = response.status();
            if !status.is_client_error() && !status.is_server_error() {
                return Ok(response);
            }
            if status.as_u16() != self.auth_failure_status {
                return Err(error_from_response(response).await);
            }

            if self.is_refresh_request(&request) {
                return Err(self.terminal(TerminalReason::RefreshEndpointRejected));
            }
            if request.auth_retries() >= self.max_auth_retries {
                return Err(self.terminal(TerminalReason::RetryExhausted));
            }
            request.mark_retried();

            let current = self.current_token();
            match (request.sent_token(), current.as_deref()) {
                // Sent with a token but the session is gone (logout, or another
                // request's terminal failure). Whoever cleared it already redirected.
                (Some(_), None) => {
                    debug!(url = %request.url(), "Session cleared while request was in flight");
                    return Err(ClientError::auth_expired(TerminalReason::SessionEnded));
                }
                (sent, Some(current)) if sent != Some(current) => {
                    debug!(url = %request.url(), "Token changed since send, retrying without refresh");
                }
                _ => {
                    if let RefreshOutcome::Failed(failure) = self.refresh().await {
                        return Err(ClientError::auth_expired(terminal_reason(&failure)));
                    }
                }
            }

            self.attach_token(&mut request);
            debug!(
                method = %request.method(),
                url = %request.url(),
                attempt = request.auth_retries(),
                "Resubmitting request with refreshed token"
            );
            outcome = self.dispatch(&request).await;
        }
    }

    /// Join or start the single in-flight refresh
    ///
    /// A failed refresh clears the session and fires the redirect hook exactly
    /// once per flight, however many callers are waiting on it.
    pub async fn refresh(&self) -> RefreshOutcome {
        let refresher = self.refresher.clone();
        let budget = self.budget.clone();
        let expiry = self.expiry.clone();

        self.coordinator
            .run(move || {
                async move {
                    let outcome = if budget.try_acquire() {
                        refresher.refresh().await
                    } else {
                        RefreshOutcome::Failed(RefreshFailure::BudgetExceeded)
                    };
                    match &outcome {
                        RefreshOutcome::Refreshed(_) => info!("Session refreshed"),
                        RefreshOutcome::Failed(failure) => expiry.expire(&terminal_reason(failure)),
                    }
                    outcome
                }
                .boxed()
            })
            .await
    }

    /// Whether a refresh is in flight right now
    pub fn is_refreshing(&self) -> bool {
        self.coordinator.is_refreshing()
    }

    /// Clear the session and fire the login redirect
    pub fn expire_session(&self, reason: &TerminalReason) {
        self.expiry.expire(reason);
    }

    /// Forget previous refreshes, e.g. after a fresh login
    pub fn reset_refresh_budget(&self) {
        self.budget.reset();
    }

    fn terminal(&self, reason: TerminalReason) -> ClientError {
        self.expiry.expire(&reason);
        ClientError::auth_expired(reason)
    }

    fn is_refresh_request(&self, request: &PendingRequest) -> bool {
        request
            .path()
            .is_some_and(|path| path.trim_end_matches('/') == self.refresh_path.trim_end_matches('/'))
    }

    async fn dispatch(&self, request: &PendingRequest) -> Result<Response, reqwest::Error> {
        request.build(&self.http_client).send().await
    }
}

/// Turn a non-success response into [`ClientError::Api`]
///
/// Uses the backend's JSON `message` (or `error`) field when there is one.
async fn error_from_response(response: Response) -> ClientError {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();

    let message = serde_json::from_str::<serde_json::Value>(&text)
        .ok()
        .and_then(|body| {
            body.get("message")
                .or_else(|| body.get("error"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| {
            let text = text.trim();
            if text.is_empty() {
                status.canonical_reason().unwrap_or_default().to_string()
            } else {
                text.chars().take(MAX_ERROR_BODY).collect()
            }
        });

    ClientError::api(status.as_u16(), message)
}
