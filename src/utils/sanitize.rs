// src/utils/sanitize.rs

use std::sync::OnceLock;

use regex::Regex;

use crate::error::AppError;

static SAFE_COMPONENT: OnceLock<Regex> = OnceLock::new();

fn safe_component_re() -> &'static Regex {
    SAFE_COMPONENT.get_or_init(|| {
        // Alphanumeric first character, then word characters, spaces, dots
        // and dashes. Rules out `..`, hidden files and path separators.
        Regex::new(r"^[A-Za-z0-9][A-Za-z0-9 ._-]*$").expect("invalid safe-component regex")
    })
}

/// Validates a client-supplied exam name or filename before it is used as a
/// path segment. Everything that reaches the filesystem goes through here.
pub fn validate_component(name: &str) -> Result<&str, AppError> {
    if name.len() <= 255 && safe_component_re().is_match(name) {
        Ok(name)
    } else {
        Err(AppError::BadRequest(format!(
            "Invalid name '{}': only letters, digits, spaces, '.', '_' and '-' are allowed",
            name
        )))
    }
}
