//! Stockroom CLI application
//!
//! Command-line client for the Stockroom inventory backend.
//!
//! ```bash
//! stockroom login --email asha@example.com
//! stockroom request GET /api/rawMaterial/all
//! stockroom whoami
//! stockroom logout
//! ```
//!
//! The session (access token, profile and refresh cookie) is kept under
//! `~/.stockroom/session` unless `--session-dir` or `session_dir` in
//! `stockroom.toml` says otherwise.

mod args;
mod commands;
mod console;
mod router;

use args::Cli;
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins unless --verbose is given
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let console = console::CliConsole::new(cli.verbose);
    match router::route(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            console.error(&commands::describe_error(&e));
            ExitCode::FAILURE
        }
    }
}
