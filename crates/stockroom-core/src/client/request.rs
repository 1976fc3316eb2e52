//! Replayable request description

use crate::error::{ClientError, ClientResult};
use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;

/// An HTTP call that can be sent again after a token refresh
///
/// `auth_retries` counts resubmissions caused by authorization failures; it
/// is the marker that keeps one request from looping through refreshes.
#[derive(Debug, Clone)]
pub struct PendingRequest {
    method: Method,
    url: String,
    headers: HeaderMap,
    body: Option<Vec<u8>>,
    auth_retries: u32,
    sent_token: Option<String>,
}

impl PendingRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            body: None,
            auth_retries: 0,
            sent_token: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn put(url: impl Into<String>) -> Self {
        Self::new(Method::PUT, url)
    }

    pub fn patch(url: impl Into<String>) -> Self {
        Self::new(Method::PATCH, url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::DELETE, url)
    }

    /// Add a header
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Set a raw body
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Set a JSON body and content type
    pub fn with_json<T: Serialize + ?Sized>(mut self, body: &T) -> ClientResult<Self> {
        let bytes = serde_json::to_vec(body)
            .map_err(|e| ClientError::invalid_request(format!("body is not valid JSON: {}", e)))?;
        self.headers.insert(
            reqwest::header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        self.body = Some(bytes);
        Ok(self)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    /// Resubmissions caused by authorization failures so far
    pub fn auth_retries(&self) -> u32 {
        self.auth_retries
    }

    pub(crate) fn mark_retried(&mut self) {
        self.auth_retries += 1;
    }

    /// Token attached on the most recent send, if any
    pub fn sent_token(&self) -> Option<&str> {
        self.sent_token.as_deref()
    }

    pub(crate) fn set_sent_token(&mut self, token: Option<String>) {
        self.sent_token = token;
    }

    /// URL path, used to recognise the refresh call
    pub(crate) fn path(&self) -> Option<String> {
        reqwest::Url::parse(&self.url)
            .ok()
            .map(|url| url.path().to_string())
    }

    /// Build a `reqwest` request for one send
    pub(crate) fn build(&self, client: &reqwest::Client) -> reqwest::RequestBuilder {
        let mut builder = client
            .request(self.method.clone(), &self.url)
            .headers(self.headers.clone());
        if let Some(body) = &self.body {
            builder = builder.body(body.clone());
        }
        builder
    }
}
