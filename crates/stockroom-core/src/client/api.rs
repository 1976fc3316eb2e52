//! Configured backend client
//!
//! Every call goes through the [`AuthInterceptor`], so feature code never
//! deals with tokens or refreshes itself. Login and signup are the only
//! calls sent without interception.

use super::request::PendingRequest;
use super::types::{AuthResponse, LoginRequest, SignupRequest};
use crate::auth::{AuthInterceptor, HttpTokenRefresher, LogRedirect, LoginRedirect, TokenRefresher};
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::session::{MemorySessionStore, Session, SessionCookieJar, SessionStore, UserProfile};
use reqwest::{Method, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, info};

/// Builder for [`ApiClient`]
pub struct ApiClientBuilder {
    config: ClientConfig,
    store: Option<Arc<dyn SessionStore>>,
    cookies: Option<Arc<SessionCookieJar>>,
    redirect: Option<Arc<dyn LoginRedirect>>,
    refresher: Option<Arc<dyn TokenRefresher>>,
    no_proxy: bool,
}

impl ApiClientBuilder {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            store: None,
            cookies: None,
            redirect: None,
            refresher: None,
            no_proxy: false,
        }
    }

    /// Session storage (defaults to in-memory)
    pub fn with_session_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Cookie jar holding the refresh cookie (defaults to in-memory)
    pub fn with_cookie_jar(mut self, cookies: Arc<SessionCookieJar>) -> Self {
        self.cookies = Some(cookies);
        self
    }

    /// Hook fired on terminal auth failures (defaults to logging)
    pub fn with_login_redirect(mut self, redirect: Arc<dyn LoginRedirect>) -> Self {
        self.redirect = Some(redirect);
        self
    }

    /// Replace the HTTP refresher
    pub fn with_refresher(mut self, refresher: Arc<dyn TokenRefresher>) -> Self {
        self.refresher = Some(refresher);
        self
    }

    /// Ignore system proxy settings
    pub fn no_proxy(mut self) -> Self {
        self.no_proxy = true;
        self
    }

    pub fn build(self) -> ClientResult<ApiClient> {
        let config = self.config;
        config.validate()?;

        let cookies = self
            .cookies
            .unwrap_or_else(|| Arc::new(SessionCookieJar::new()));
        let mut http_builder = reqwest::Client::builder()
            .cookie_provider(cookies.clone())
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout);
        if self.no_proxy {
            http_builder = http_builder.no_proxy();
        }
        let http_client = http_builder
            .build()
            .map_err(|e| ClientError::config(format!("Failed to create HTTP client: {}", e)))?;

        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemorySessionStore::new()));
        let redirect = self.redirect.unwrap_or_else(|| Arc::new(LogRedirect));
        let refresher = self.refresher.unwrap_or_else(|| {
            Arc::new(HttpTokenRefresher::new(
                http_client.clone(),
                config.endpoint_url(&config.auth.refresh_path),
                config.auth.auth_failure_status,
                store.clone(),
            ))
        });

        let interceptor = AuthInterceptor::new(
            http_client.clone(),
            &config.auth,
            store.clone(),
            refresher,
            redirect,
        );

        Ok(ApiClient {
            config,
            http_client,
            store,
            cookies,
            interceptor,
        })
    }
}

/// Authenticated client for the inventory backend
pub struct ApiClient {
    config: ClientConfig,
    http_client: reqwest::Client,
    store: Arc<dyn SessionStore>,
    cookies: Arc<SessionCookieJar>,
    interceptor: AuthInterceptor,
}

impl ApiClient {
    /// Client with in-memory session and cookies
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        ApiClientBuilder::new(config).build()
    }

    pub fn builder(config: ClientConfig) -> ApiClientBuilder {
        ApiClientBuilder::new(config)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Describe a call to `path` on the backend
    pub fn request(&self, method: Method, path: &str) -> PendingRequest {
        PendingRequest::new(method, self.config.endpoint_url(path))
    }

    /// Send a request through the interceptor
    pub async fn send(&self, request: PendingRequest) -> ClientResult<Response> {
        debug!(method = %request.method(), url = %request.url(), "Sending request");
        self.interceptor.execute(request).await
    }

    /// Send a request and decode the JSON body
    pub async fn send_json<T: DeserializeOwned>(&self, request: PendingRequest) -> ClientResult<T> {
        let response = self.send(request).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ClientError::decode(e.to_string()))
    }

    pub async fn get(&self, path: &str) -> ClientResult<Response> {
        self.send(self.request(Method::GET, path)).await
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.send_json(self.request(Method::GET, path)).await
    }

    pub async fn delete(&self, path: &str) -> ClientResult<Response> {
        self.send(self.request(Method::DELETE, path)).await
    }

    pub async fn post_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ClientResult<Response> {
        self.send(self.request(Method::POST, path).with_json(body)?).await
    }

    pub async fn put_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ClientResult<Response> {
        self.send(self.request(Method::PUT, path).with_json(body)?).await
    }

    pub async fn patch_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ClientResult<Response> {
        self.send(self.request(Method::PATCH, path).with_json(body)?).await
    }

    /// Log in and store the new session
    pub async fn login(&self, credentials: &LoginRequest) -> ClientResult<Session> {
        let path = self.config.auth.login_path.clone();
        self.authenticate(&path, credentials).await
    }

    /// Create an account and store the new session
    pub async fn signup(&self, form: &SignupRequest) -> ClientResult<Session> {
        let path = self.config.auth.signup_path.clone();
        self.authenticate(&path, form).await
    }

    async fn authenticate<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ClientResult<Session> {
        let response = self
            .http_client
            .post(self.config.endpoint_url(path))
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        let parsed = serde_json::from_str::<AuthResponse>(&text).ok();

        if !status.is_success() {
            let message = parsed
                .and_then(|body| body.message)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or_default().to_string());
            return Err(if status.is_client_error() {
                ClientError::Rejected(message)
            } else {
                ClientError::api(status.as_u16(), message)
            });
        }

        let body = parsed.ok_or_else(|| ClientError::decode("unreadable authentication response"))?;
        if !body.success {
            return Err(ClientError::Rejected(
                body.message
                    .unwrap_or_else(|| "Authentication failed".to_string()),
            ));
        }
        let token = body
            .access_token
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| ClientError::decode("authentication response carried no access token"))?;

        self.store.clear()?;
        self.store.set_token(&token)?;
        if let Some(user) = &body.user {
            self.store.set_user(user)?;
        }
        self.interceptor.reset_refresh_budget();

        info!(
            user = body.user.as_ref().map(|u| u.email.as_str()).unwrap_or("unknown"),
            "Authenticated"
        );
        Ok(Session {
            access_token: Some(token),
            user: body.user,
        })
    }

    /// Drop the local session and cookies
    pub fn logout(&self) -> ClientResult<()> {
        self.store.clear()?;
        self.cookies.clear()?;
        info!("Logged out");
        Ok(())
    }

    /// Current session snapshot
    pub fn session(&self) -> ClientResult<Session> {
        Ok(self.store.load()?)
    }

    /// Stored profile of the logged-in user
    pub fn current_user(&self) -> ClientResult<Option<UserProfile>> {
        Ok(self.store.user()?)
    }

    /// Force-clear the session and fire the login redirect for terminal auth failures
    ///
    /// Returns `false` (and does nothing) for any other error.
    pub fn handle_auth_error(&self, error: &ClientError) -> bool {
        let Some(reason) = error.terminal_reason() else {
            return false;
        };
        self.interceptor.expire_session(reason);
        true
    }
}
