//! # Route Guard
//!
//! Turns a [`SessionState`] and a requested path into the decision a route
//! guard adapter acts on. All policy comes from `portal_core::access`; this
//! module only fixes the order the checks run in.
//!
//! ```text
//! loading                                 → Wait
//! anonymous, /auth/*                      → Allow
//! anonymous, anything else                → Redirect(/auth/login)
//! should_redirect_from_path               → Redirect(landing)
//! can_access_route                        → Allow
//! on the activation landing               → Allow
//! on any other landing it cannot access   → Deny
//! otherwise                               → Redirect(landing)
//! ```
//!
//! A redirect never targets the path being guarded.

use portal_core::routes::{is_auth_path, same_path, LOGIN_PATH};
use portal_core::{can_access_route, post_login_redirect, should_redirect_from_path};

use crate::state::SessionState;

/// What a route guard should do with a navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Session still settling; render a placeholder.
    Wait,
    /// Render the requested screen.
    Allow,
    /// Navigate to this path instead.
    Redirect(String),
    /// Signed in, but the account may not view any screen (unrecognised
    /// role). Render a forbidden page rather than redirect in a loop.
    Deny,
}

impl GuardDecision {
    /// The redirect target, if any.
    pub fn redirect_target(&self) -> Option<&str> {
        match self {
            Self::Redirect(path) => Some(path),
            _ => None,
        }
    }
}

/// Decide what to do with a navigation to `path`.
pub fn evaluate(state: &SessionState, path: &str) -> GuardDecision {
    if state.loading {
        return GuardDecision::Wait;
    }

    let Some(user) = state.user.as_ref() else {
        return if is_auth_path(path) {
            GuardDecision::Allow
        } else {
            GuardDecision::Redirect(LOGIN_PATH.to_string())
        };
    };

    let landing = post_login_redirect(user);
    if should_redirect_from_path(user, path) {
        return GuardDecision::Redirect(landing.to_string());
    }
    if can_access_route(user, path) {
        return GuardDecision::Allow;
    }
    if same_path(path, landing) {
        return if user.needs_activation() {
            GuardDecision::Allow
        } else {
            GuardDecision::Deny
        };
    }
    GuardDecision::Redirect(landing.to_string())
}
