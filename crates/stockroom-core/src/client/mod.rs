//! Backend client
//!
//! [`ApiClient`] is the one entry point feature code uses to talk to the
//! inventory backend. Requests are described as [`PendingRequest`]s and sent
//! through the auth interceptor.

mod api;
mod request;
mod types;

pub use api::{ApiClient, ApiClientBuilder};
pub use request::PendingRequest;
pub use types::{AuthResponse, LoginRequest, SignupRequest};
