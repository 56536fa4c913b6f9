//! # Session State
//!
//! The snapshot broadcast to subscribers on every transition.
//!
//! ```text
//! UNINITIALIZED ─initialize()─▶ INITIALIZING ─┬─▶ AUTHENTICATED ◀─┐
//!                                             └─▶ ANONYMOUS ◀─────┤
//!                                                                 │
//!        login()/register() ─▶ AUTHENTICATING ────────────────────┤
//!        refresh_user()     ─▶ REFRESHING ────────────────────────┘
//! ```
//!
//! `AUTHENTICATING` and `REFRESHING` are transient and always resolve to
//! `ANONYMOUS` or `AUTHENTICATED`.

use portal_core::AccountProfile;
use serde::{Deserialize, Serialize};

/// Position in the session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionPhase {
    /// Nothing has run yet.
    Uninitialized,
    /// Reading the stored credential and validating it.
    Initializing,
    /// No signed-in user.
    Anonymous,
    /// A profile is loaded.
    Authenticated,
    /// Login or registration in flight.
    Authenticating,
    /// Profile refresh in flight.
    Refreshing,
}

impl SessionPhase {
    /// Whether the phase resolves on its own once a remote call returns.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Initializing | Self::Authenticating | Self::Refreshing
        )
    }

    /// The canonical phase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uninitialized => "UNINITIALIZED",
            Self::Initializing => "INITIALIZING",
            Self::Anonymous => "ANONYMOUS",
            Self::Authenticated => "AUTHENTICATED",
            Self::Authenticating => "AUTHENTICATING",
            Self::Refreshing => "REFRESHING",
        }
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Session snapshot.
///
/// Only [`crate::SessionManager`] produces these. `is_authenticated` is
/// recomputed from `user` on every commit, so the two never disagree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    /// Signed-in account, replaced wholesale on each fetch.
    pub user: Option<AccountProfile>,
    /// A login, registration or initialization call is in flight.
    pub loading: bool,
    /// Message from the last failed operation.
    pub error: Option<String>,
    /// Mirrors `user.is_some()`.
    pub is_authenticated: bool,
    /// The first initialization attempt has finished.
    pub initialized: bool,
    /// Lifecycle position.
    pub phase: SessionPhase,
}

impl SessionState {
    /// State of a freshly constructed manager. `loading` starts `true` so
    /// route guards wait for initialization instead of bouncing to login.
    pub fn initial() -> Self {
        Self {
            user: None,
            loading: true,
            error: None,
            is_authenticated: false,
            initialized: false,
            phase: SessionPhase::Uninitialized,
        }
    }

    /// The settled phase implied by `user`.
    pub(crate) fn resting_phase(&self) -> SessionPhase {
        if self.user.is_some() {
            SessionPhase::Authenticated
        } else {
            SessionPhase::Anonymous
        }
    }

    /// Re-derive `is_authenticated` from `user`.
    pub(crate) fn sync_authenticated(&mut self) {
        self.is_authenticated = self.user.is_some();
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::initial()
    }
}
