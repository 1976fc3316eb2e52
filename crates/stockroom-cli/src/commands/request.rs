//! Raw authenticated requests

use super::CliContext;
use anyhow::{Context, bail};
use colored::Colorize;
use stockroom_core::Method;

/// Parse a method name, case-insensitively
fn parse_method(method: &str) -> anyhow::Result<Method> {
    let method = method.to_ascii_uppercase();
    match method.as_str() {
        "GET" | "POST" | "PUT" | "PATCH" | "DELETE" => Ok(Method::from_bytes(method.as_bytes())?),
        other => bail!("Unsupported method '{}'", other),
    }
}

/// Pretty-print a JSON body, or return it unchanged
fn format_body(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| serde_json::to_string_pretty(&value).ok())
        .unwrap_or_else(|| body.to_string())
}

pub async fn execute(
    ctx: &CliContext,
    method: &str,
    path: &str,
    data: Option<&str>,
) -> anyhow::Result<()> {
    let method = parse_method(method)?;
    let mut request = ctx.client.request(method, path);
    if let Some(data) = data {
        let body: serde_json::Value =
            serde_json::from_str(data).context("--data is not valid JSON")?;
        request = request.with_json(&body)?;
    }

    let response = ctx.client.send(request).await?;
    let status = response.status();
    let body = response.text().await.context("Failed to read response body")?;

    ctx.console.info(&format!("{}", status.to_string().green()));
    if !body.trim().is_empty() {
        println!("{}", format_body(&body));
    }
    Ok(())
}
