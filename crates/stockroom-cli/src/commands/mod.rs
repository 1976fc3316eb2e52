//! CLI commands

pub mod auth;
pub mod request;

use crate::args::Cli;
use crate::console::CliConsole;
use anyhow::Context;
use std::path::PathBuf;
use std::sync::Arc;
use stockroom_core::{
    ApiClient, ClientError, FileSessionStore, LoginRedirect, SessionCookieJar, TerminalReason,
    load_config,
};

/// Login redirect for a terminal: tell the user to log in again
struct CliLoginRedirect {
    console: CliConsole,
}

impl LoginRedirect for CliLoginRedirect {
    fn redirect_to_login(&self, reason: &TerminalReason) {
        self.console.warn(&format!(
            "Session expired ({}). Run `stockroom login` to sign in again.",
            reason
        ));
    }
}

/// Everything a command needs: the configured client and the console
pub struct CliContext {
    pub client: ApiClient,
    pub console: CliConsole,
    pub session_dir: PathBuf,
}

impl CliContext {
    /// Load configuration and open the persisted session
    pub fn from_cli(cli: &Cli) -> anyhow::Result<Self> {
        let mut config =
            load_config(cli.config.as_deref()).context("Failed to load configuration")?;
        if let Some(dir) = &cli.session_dir {
            config = config.with_session_dir(dir);
        }
        let console = CliConsole::new(cli.verbose);

        let session_dir = match config.session_dir.clone() {
            Some(dir) => dir,
            None => FileSessionStore::default_location()?.path().to_path_buf(),
        };
        let cookies = SessionCookieJar::persistent(&session_dir);

        let client = ApiClient::builder(config)
            .with_session_store(Arc::new(FileSessionStore::new(&session_dir)))
            .with_cookie_jar(Arc::new(cookies))
            .with_login_redirect(Arc::new(CliLoginRedirect { console }))
            .build()?;

        console.info(&format!("Backend: {}", client.config().base_url));
        console.info(&format!("Session: {}", session_dir.display()));

        Ok(Self {
            client,
            console,
            session_dir,
        })
    }
}

/// One-line description of a command failure
pub fn describe_error(error: &anyhow::Error) -> String {
    match error.downcast_ref::<ClientError>() {
        Some(e @ (ClientError::Network(_) | ClientError::AuthExpired { .. })) => e.user_message(),
        Some(e) => e.to_string(),
        None => format!("{:#}", error),
    }
}
