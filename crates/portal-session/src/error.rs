//! # Session Error Types
//!
//! Most session operations never return an error: failures land in
//! [`crate::SessionState::error`]. The types here cover the exceptions:
//! credential-store I/O (logged, never fatal), the stateless password-reset
//! pass-throughs, and [`crate::SessionManager::require_user`].

use std::path::PathBuf;

use portal_client::ProfileServiceError;
use portal_core::ValidationError;
use thiserror::Error;

/// Errors from session operations that report to the caller directly.
#[derive(Error, Debug)]
pub enum SessionError {
    /// An operation needed a signed-in user and there is none.
    #[error("no authenticated user")]
    NotAuthenticated,

    /// Input rejected before reaching the profile service.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The profile service call failed.
    #[error("profile service error: {0}")]
    Service(#[from] ProfileServiceError),
}

/// Credential persistence failures.
#[derive(Error, Debug)]
pub enum CredentialStoreError {
    /// Reading or writing the backing file failed.
    #[error("credential store I/O error at {path}: {source}")]
    Io {
        /// File being accessed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The backing file is not a JSON object.
    #[error("credential store at {path} is corrupt: {source}")]
    Json {
        /// File being parsed.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },
}
