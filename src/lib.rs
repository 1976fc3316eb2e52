//! Stockroom
//!
//! Authenticated client for the Stockroom inventory backend. This crate
//! re-exports [`stockroom_core`]; the `stockroom` binary lives in
//! `stockroom-cli`.

pub use stockroom_core::*;
