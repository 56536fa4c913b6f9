//! # Profile Service Contract
//!
//! The remote collaborator the session layer talks to. [`ProfileService`] is
//! the seam: production code uses [`crate::HttpProfileClient`], tests plug
//! in scripted implementations.
//!
//! | Operation | Success | Failure the session reacts to |
//! |-----------|---------|-------------------------------|
//! | `authenticate` | profile + credential | `InvalidCredentials` |
//! | `register` | profile + credential | `Validation` |
//! | `fetch_profile` | profile | `Unauthorized` |
//! | `invalidate` | `()` | ignored |
//! | `forgot_password` / `reset_password` | message | returned to caller |

use async_trait::async_trait;
use portal_core::error::{require_field, validate_email, validate_new_password};
use portal_core::{AccountProfile, Credential, ValidationError};
use serde::{Deserialize, Serialize};

use crate::error::ProfileServiceError;

// -- Requests -------------------------------------------------------------------

/// Email/password sign-in.
#[derive(Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Reject obviously malformed input before a round-trip.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_email(&self.email)?;
        require_field("password", &self.password)
    }
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// New investor account.
#[derive(Clone, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    /// Checked locally, never sent.
    #[serde(skip)]
    pub confirm_password: String,
    pub full_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_field("full_name", &self.full_name)?;
        validate_email(&self.email)?;
        validate_new_password(&self.password, Some(&self.confirm_password))
    }
}

impl std::fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("full_name", &self.full_name)
            .field("phone", &self.phone)
            .finish()
    }
}

/// Request a password-reset email.
#[derive(Debug, Clone, Serialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

impl ForgotPasswordRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_email(&self.email)
    }
}

/// Complete a password reset with the emailed token.
#[derive(Clone, Serialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
    #[serde(skip)]
    pub confirm_password: String,
}

impl ResetPasswordRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_field("token", &self.token)?;
        validate_new_password(&self.new_password, Some(&self.confirm_password))
    }
}

impl std::fmt::Debug for ResetPasswordRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResetPasswordRequest")
            .field("token", &"[REDACTED]")
            .field("new_password", &"[REDACTED]")
            .finish()
    }
}

// -- Responses ------------------------------------------------------------------

/// Successful login or registration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub access_token: Credential,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub user: AccountProfile,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// Acknowledgement returned by password-reset endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: String,
}

// -- Contract -------------------------------------------------------------------

/// Remote profile service.
#[async_trait]
pub trait ProfileService: Send + Sync {
    /// Exchange email/password for a credential and the account profile.
    async fn authenticate(&self, req: &LoginRequest) -> Result<AuthResponse, ProfileServiceError>;

    /// Create an account; the returned profile is not yet activated.
    async fn register(&self, req: &RegisterRequest) -> Result<AuthResponse, ProfileServiceError>;

    /// Fetch the profile for `credential`.
    async fn fetch_profile(
        &self,
        credential: &Credential,
    ) -> Result<AccountProfile, ProfileServiceError>;

    /// Invalidate `credential` server-side.
    async fn invalidate(&self, credential: &Credential) -> Result<(), ProfileServiceError>;

    async fn forgot_password(
        &self,
        req: &ForgotPasswordRequest,
    ) -> Result<MessageResponse, ProfileServiceError>;

    async fn reset_password(
        &self,
        req: &ResetPasswordRequest,
    ) -> Result<MessageResponse, ProfileServiceError>;
}
