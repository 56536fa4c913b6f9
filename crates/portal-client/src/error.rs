//! Profile-service client error types.

use portal_core::ValidationError;

/// Coarse failure classes the session layer reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Credential missing, invalid or expired. Clears the session.
    Unauthorized,
    /// Bad login/registration input. Surfaced to the user, session unchanged.
    ValidationFailure,
    /// Transport, server or decoding failure. Surfaced to the user.
    NetworkFailure,
}

/// Errors from profile-service calls.
#[derive(Debug, thiserror::Error)]
pub enum ProfileServiceError {
    /// The bearer credential was rejected.
    #[error("{endpoint} rejected the credential")]
    Unauthorized { endpoint: String },
    /// Login or registration refused the supplied credentials.
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),
    /// The service or client-side checks rejected the request body.
    #[error("validation failed: {0}")]
    Validation(String),
    /// HTTP transport error, including timeouts.
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        endpoint: String,
        source: reqwest::Error,
    },
    /// The service returned an unexpected non-2xx status.
    #[error("profile service {endpoint} returned {status}: {body}")]
    Api {
        endpoint: String,
        status: u16,
        body: String,
    },
    /// Response deserialization failed.
    #[error("failed to deserialize response from {endpoint}: {source}")]
    Deserialization {
        endpoint: String,
        source: reqwest::Error,
    },
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] super::config::ConfigError),
}

impl ProfileServiceError {
    /// Classify the error for session handling.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized { .. } => ErrorKind::Unauthorized,
            Self::InvalidCredentials(_) | Self::Validation(_) => ErrorKind::ValidationFailure,
            Self::Http { .. }
            | Self::Api { .. }
            | Self::Deserialization { .. }
            | Self::Config(_) => ErrorKind::NetworkFailure,
        }
    }

    /// Whether this error means the credential is no longer valid.
    pub fn is_unauthorized(&self) -> bool {
        self.kind() == ErrorKind::Unauthorized
    }

    /// Message suitable for the session `error` field.
    ///
    /// Server-supplied validation text is passed through; transport detail
    /// is not, since it tends to leak internal hostnames.
    pub fn user_message(&self) -> String {
        match self {
            Self::Unauthorized { .. } => "Your session has expired. Please sign in again.".into(),
            Self::InvalidCredentials(msg) | Self::Validation(msg) => msg.clone(),
            Self::Http { source, .. } if source.is_timeout() => {
                "The portal service timed out. Please try again.".into()
            }
            Self::Http { .. } | Self::Config(_) => {
                "Unable to reach the portal service. Please try again.".into()
            }
            Self::Api { status, .. } => {
                format!("The portal service returned an error ({status}). Please try again.")
            }
            Self::Deserialization { .. } => {
                "The portal service sent an unexpected response.".into()
            }
        }
    }
}

impl From<ValidationError> for ProfileServiceError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}
