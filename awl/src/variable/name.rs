//! Naming rules for variables and jump labels.

use crate::parser::error::{ErrorKind, ParseError};

pub const MAX_IDENT_LEN: usize = 24;
pub const MAX_LABEL_LEN: usize = 4;

/// Check a variable name: 1 to 24 characters of `[A-Za-z0-9_]`, no leading
/// digit, no trailing `_`, no `__`.
pub fn validate_ident(name: &str) -> Result<(), ParseError> {
    let reason = if name.is_empty() || name.len() > MAX_IDENT_LEN {
        Some("must be 1 to 24 characters long")
    } else if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Some("may only contain letters, digits and '_'")
    } else if name.starts_with(|c: char| c.is_ascii_digit()) {
        Some("must not start with a digit")
    } else if name.ends_with('_') {
        Some("must not end with '_'")
    } else if name.contains("__") {
        Some("must not contain '__'")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(ParseError::new(
            ErrorKind::InvalidIdentifier,
            format!("invalid variable name '{}': {}", name, reason),
        )),
        None => Ok(()),
    }
}

/// Check a dotted member path such as `rec.field`; every component must be
/// a valid variable name.
pub fn validate_path(path: &str) -> Result<(), ParseError> {
    path.split('.').try_for_each(validate_ident)
}

/// Check a jump label: `[A-Za-z_][A-Za-z0-9_]{0,3}`.
pub fn validate_label(label: &str) -> Result<(), ParseError> {
    let mut chars = label.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            label.len() <= MAX_LABEL_LEN
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };

    if valid {
        Ok(())
    } else {
        Err(ParseError::new(
            ErrorKind::InvalidIdentifier,
            format!("invalid label '{}'", label),
        ))
    }
}
