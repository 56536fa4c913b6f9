//! # Error Hierarchy
//!
//! Validation errors for user-supplied input, built with `thiserror`.
//! Transport and session errors live in `portal-client` and
//! `portal-session`; this crate only rejects malformed domain input before
//! it ever reaches the network.

use thiserror::Error;

/// Minimum accepted password length for registration and reset.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Validation errors for login, registration and password-reset input.
///
/// Each variant carries enough context for the UI to render a message
/// without re-inspecting the request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field was empty or whitespace.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// Email address does not look like `local@domain`.
    #[error("invalid email address: \"{0}\"")]
    InvalidEmail(String),

    /// Password is shorter than [`MIN_PASSWORD_LEN`].
    #[error("password must be at least {min} characters")]
    PasswordTooShort {
        /// The enforced minimum.
        min: usize,
    },

    /// Password and confirmation differ.
    #[error("passwords do not match")]
    PasswordMismatch,
}

/// Check that `value` is non-blank.
pub fn require_field(name: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField(name));
    }
    Ok(())
}

/// Shallow email syntax check: one `@`, non-empty local part, dotted domain.
///
/// The remote service remains the authority; this only catches typos before
/// a round-trip.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    require_field("email", email)?;
    let trimmed = email.trim();
    let valid = match trimmed.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmail(trimmed.to_string()))
    }
}

/// Enforce [`MIN_PASSWORD_LEN`] and, when given, the confirmation match.
pub fn validate_new_password(
    password: &str,
    confirmation: Option<&str>,
) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort {
            min: MIN_PASSWORD_LEN,
        });
    }
    match confirmation {
        Some(confirm) if confirm != password => Err(ValidationError::PasswordMismatch),
        _ => Ok(()),
    }
}
