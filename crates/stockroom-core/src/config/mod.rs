//! Client configuration
//!
//! Defaults, an optional TOML file and `STOCKROOM__*` environment variables
//! are layered through the `config` crate.

mod client_config;
mod loader;
pub mod timeouts;

pub use client_config::{AuthConfig, ClientConfig, RefreshBudgetConfig};
pub use loader::{CONFIG_FILE_NAME, ENV_PREFIX, load_config, load_config_from};
