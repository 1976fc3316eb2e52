//! Layered configuration loading

use super::ClientConfig;
use crate::error::ClientResult;
use config::{Config, Environment, File, FileFormat};
use std::path::Path;
use tracing::debug;

/// Default configuration file name, looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "stockroom.toml";

/// Environment prefix; nested keys are separated with `__`
/// (`STOCKROOM__AUTH__REFRESH_BUDGET__MAX_REFRESHES`)
pub const ENV_PREFIX: &str = "STOCKROOM";

/// Load configuration from defaults, an optional file and the process environment
///
/// When `path` is `None`, `stockroom.toml` in the working directory is used if
/// it exists. An explicit path must exist.
pub fn load_config(path: Option<&Path>) -> ClientResult<ClientConfig> {
    build(path, None)
}

/// Load configuration with an explicit set of environment variables
///
/// The process environment is ignored. Useful for embedding and tests.
pub fn load_config_from(
    path: Option<&Path>,
    env: impl IntoIterator<Item = (String, String)>,
) -> ClientResult<ClientConfig> {
    build(path, Some(env.into_iter().collect()))
}

fn build(path: Option<&Path>, env: Option<config::Map<String, String>>) -> ClientResult<ClientConfig> {
    let file = match path {
        Some(path) => File::from(path).format(FileFormat::Toml).required(true),
        None => File::from(Path::new(CONFIG_FILE_NAME))
            .format(FileFormat::Toml)
            .required(false),
    };

    let settings = Config::builder()
        .add_source(file)
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true)
                .source(env),
        )
        .build()?;

    let config: ClientConfig = settings.try_deserialize()?;
    config.validate()?;

    debug!(
        base_url = %config.base_url,
        refresh_path = %config.auth.refresh_path,
        "Loaded client configuration"
    );
    Ok(config)
}
