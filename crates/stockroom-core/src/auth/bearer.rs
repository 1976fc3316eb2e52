//! `Authorization: Bearer` header handling

use reqwest::header::{HeaderValue, InvalidHeaderValue};

/// Scheme prefix carried by every authorization header
pub const BEARER_PREFIX: &str = "Bearer ";

/// Strip whitespace and any number of leading `Bearer` schemes from a stored token
///
/// The scheme only counts as a whole word, so `Bearerish` is kept as is.
/// Returns `None` when nothing is left.
pub fn normalize_token(raw: &str) -> Option<&str> {
    let scheme = BEARER_PREFIX.trim_end();
    let mut token = raw.trim();
    while let Some(head) = token.get(..scheme.len()) {
        let rest = &token[scheme.len()..];
        let whole_word = rest.is_empty() || rest.starts_with(char::is_whitespace);
        if !head.eq_ignore_ascii_case(scheme) || !whole_word {
            break;
        }
        token = rest.trim_start();
    }
    if token.is_empty() { None } else { Some(token) }
}

/// Build the header value for a normalized token
pub fn bearer_header(token: &str) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut value = HeaderValue::from_str(&format!("{}{}", BEARER_PREFIX, token))?;
    value.set_sensitive(true);
    Ok(value)
}
