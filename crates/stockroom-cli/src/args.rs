//! CLI argument definitions using clap

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "stockroom")]
#[command(about = "Stockroom - command-line client for the inventory backend")]
#[command(version)]
pub struct Cli {
    /// Path to a TOML configuration file (defaults to ./stockroom.toml if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the stored session
    #[arg(long, global = true)]
    pub session_dir: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Log in and store the session
    Login {
        /// Account email (prompted when omitted)
        #[arg(long)]
        email: Option<String>,

        /// Password (prompted when omitted)
        #[arg(long, env = "STOCKROOM_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Create an account and store the session
    Signup {
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,

        /// Password (prompted when omitted)
        #[arg(long, env = "STOCKROOM_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        #[arg(long)]
        phone: Option<String>,

        #[arg(long)]
        company_name: Option<String>,

        #[arg(long)]
        role: Option<String>,
    },

    /// Forget the stored session
    Logout,

    /// Show the logged-in user
    Whoami,

    /// Send an authenticated request to the backend
    Request {
        /// HTTP method (GET, POST, PUT, PATCH, DELETE)
        method: String,

        /// Path on the backend, e.g. /api/rawMaterial/all
        path: String,

        /// JSON request body
        #[arg(long, short)]
        data: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "stockroom",
            "request",
            "post",
            "/api/production/add",
            "--data",
            r#"{"product":"Bread"}"#,
            "--session-dir",
            "/tmp/session",
            "-v",
        ])
        .unwrap();

        assert!(cli.verbose);
        assert_eq!(cli.session_dir, Some(PathBuf::from("/tmp/session")));
        match cli.command {
            Commands::Request { method, path, data } => {
                assert_eq!(method, "post");
                assert_eq!(path, "/api/production/add");
                assert_eq!(data.as_deref(), Some(r#"{"product":"Bread"}"#));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_signup_requires_name_and_email() {
        assert!(Cli::try_parse_from(["stockroom", "signup", "--name", "Asha"]).is_err());
        assert!(
            Cli::try_parse_from([
                "stockroom",
                "signup",
                "--name",
                "Asha",
                "--email",
                "asha@example.com"
            ])
            .is_ok()
        );
    }
}
