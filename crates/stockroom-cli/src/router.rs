//! Command routing logic for CLI

use crate::args::{Cli, Commands};
use crate::commands::{self, CliContext};

/// Route CLI commands to their respective handlers
pub async fn route(cli: Cli) -> anyhow::Result<()> {
    let ctx = CliContext::from_cli(&cli)?;

    match cli.command {
        Commands::Login { email, password } => commands::auth::login(&ctx, email, password).await,
        Commands::Signup {
            name,
            email,
            password,
            phone,
            company_name,
            role,
        } => {
            let form = commands::auth::SignupForm {
                name,
                email,
                password,
                phone,
                company_name,
                role,
            };
            commands::auth::signup(&ctx, form).await
        }
        Commands::Logout => commands::auth::logout(&ctx),
        Commands::Whoami => commands::auth::whoami(&ctx),
        Commands::Request { method, path, data } => {
            commands::request::execute(&ctx, &method, &path, data.as_deref()).await
        }
    }
}
