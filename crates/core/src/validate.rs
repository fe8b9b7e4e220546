//! Field validation helpers shared by request types.

use crate::error::{DomainError, DomainResult};

/// Require an optional text field to be present and non-blank.
///
/// Returns the trimmed value.
pub fn required<'a>(field: &str, value: Option<&'a str>) -> DomainResult<&'a str> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(DomainError::validation(format!("{field} is required"))),
    }
}

/// Reject a field that was supplied but is blank.
pub fn not_blank(field: &str, value: Option<&str>) -> DomainResult<()> {
    match value {
        Some(v) if v.trim().is_empty() => {
            Err(DomainError::validation(format!("{field} must not be empty")))
        }
        _ => Ok(()),
    }
}

/// Minimal e-mail shape check (`local@domain`).
pub fn email(value: &str) -> DomainResult<()> {
    match value.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(DomainError::validation("invalid email format")),
    }
}
