//! Shared utility functions used across multiple modules.

use crate::{Error, Result};

/// Normalize optional text by trimming whitespace and removing empties.
///
/// Returns `None` when the input is `None` or the trimmed value is empty.
pub fn normalize_text_option(value: Option<String>) -> Option<String> {
    let value = value?;
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Check if a string starts with `http://` or `https://`.
pub fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

/// Trim a service base URL and drop trailing slashes.
///
/// `what` names the setting in the error message.
pub fn normalize_base_url(raw: &str, what: &str) -> Result<String> {
    let base = raw.trim().trim_end_matches('/').to_string();
    if base.is_empty() {
        return Err(Error::InvalidInput(format!("{what} must not be empty")));
    }
    if !is_http_url(&base) {
        return Err(Error::InvalidInput(format!(
            "{what} must include http:// or https://"
        )));
    }
    Ok(base)
}

/// Truncate text to at most 180 characters for error messages.
pub fn compact_text(value: &str) -> String {
    value.trim().chars().take(180).collect()
}

/// Whether a required settings field holds a usable value.
pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Mask a secret for display, keeping the last four characters.
pub fn mask_secret(value: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        return String::new();
    }
    let chars = value.chars().collect::<Vec<_>>();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let tail = chars[chars.len() - 4..].iter().collect::<String>();
    format!("{}{tail}", "*".repeat(chars.len() - 4))
}
