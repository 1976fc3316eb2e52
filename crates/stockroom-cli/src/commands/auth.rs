//! Session commands: login, signup, logout, whoami

use super::CliContext;
use anyhow::Context;
use dialoguer::{Input, Password, theme::ColorfulTheme};
use stockroom_core::{LoginRequest, Session, SignupRequest};

/// Signup fields collected from the command line
pub struct SignupForm {
    pub name: String,
    pub email: String,
    pub password: Option<String>,
    pub phone: Option<String>,
    pub company_name: Option<String>,
    pub role: Option<String>,
}

fn prompt_email() -> anyhow::Result<String> {
    Input::<String>::with_theme(&ColorfulTheme::default())
        .with_prompt("Email")
        .interact_text()
        .context("Failed to read email")
}

fn prompt_password(confirm: bool) -> anyhow::Result<String> {
    let theme = ColorfulTheme::default();
    let mut prompt = Password::with_theme(&theme).with_prompt("Password");
    if confirm {
        prompt = prompt.with_confirmation("Confirm password", "Passwords do not match");
    }
    prompt.interact().context("Failed to read password")
}

pub async fn login(
    ctx: &CliContext,
    email: Option<String>,
    password: Option<String>,
) -> anyhow::Result<()> {
    let email = match email {
        Some(email) => email,
        None => prompt_email()?,
    };
    let password = match password {
        Some(password) => password,
        None => prompt_password(false)?,
    };

    let session = ctx.client.login(&LoginRequest::new(email, password)).await?;
    ctx.console.success(&format!("Logged in as {}", display_name(&session)));
    Ok(())
}

pub async fn signup(ctx: &CliContext, form: SignupForm) -> anyhow::Result<()> {
    let password = match form.password {
        Some(password) => password,
        None => prompt_password(true)?,
    };

    let request = SignupRequest {
        name: form.name,
        email: form.email,
        password,
        phone: form.phone,
        company_name: form.company_name,
        role: form.role,
    };
    let session = ctx.client.signup(&request).await?;
    ctx.console
        .success(&format!("Account created, logged in as {}", display_name(&session)));
    Ok(())
}

pub fn logout(ctx: &CliContext) -> anyhow::Result<()> {
    ctx.client.logout()?;
    ctx.console.success("Logged out");
    Ok(())
}

pub fn whoami(ctx: &CliContext) -> anyhow::Result<()> {
    let session = ctx.client.session()?;
    if !session.is_authenticated() {
        ctx.console.warn("Not logged in. Run `stockroom login`.");
        return Ok(());
    }

    let Some(user) = session.user else {
        ctx.console.success("Logged in (no profile stored)");
        return Ok(());
    };

    ctx.console.print_header(&user.name);
    ctx.console.print_field("Email", &user.email);
    if !user.role.is_empty() {
        ctx.console.print_field("Role", &user.role);
    }
    if let Some(company) = &user.company_name {
        ctx.console.print_field("Company", company);
    }
    if let Some(phone) = &user.phone {
        ctx.console.print_field("Phone", phone);
    }
    ctx.console
        .info(&format!("Session stored in {}", ctx.session_dir.display()));
    Ok(())
}

fn display_name(session: &Session) -> String {
    session
        .user
        .as_ref()
        .map(|user| format!("{} <{}>", user.name, user.email))
        .unwrap_or_else(|| "unknown user".to_string())
}
