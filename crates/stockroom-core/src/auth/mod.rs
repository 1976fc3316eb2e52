//! Authentication: token attachment and the refresh protocol
//!
//! Provides:
//! - Bearer header normalization
//! - Token refresh against the backend's refresh endpoint
//! - Single-flight coordination of concurrent refreshes
//! - A sliding-window refresh budget
//! - The [`AuthInterceptor`] tying them together

mod bearer;
mod budget;
mod interceptor;
mod redirect;
mod refresh;
mod single_flight;


pub use bearer::{BEARER_PREFIX, bearer_header, normalize_token};
pub use budget::RefreshBudget;
pub use interceptor::AuthInterceptor;
pub use redirect::{BroadcastRedirect, LogRedirect, LoginRedirect};
pub use refresh::{HttpTokenRefresher, RefreshFailure, RefreshOutcome, TokenRefresher};
pub use single_flight::RefreshCoordinator;
