//! # Portal Routes
//!
//! Screen paths the authorization engine can land a user on, and the path
//! prefixes that partition the portal by audience.
//!
//! Prefix checks are segment aware: `/admin` covers `/admin` and
//! `/admin/users` but not `/administrator`.

use serde::{Deserialize, Serialize};

/// Prefix of every unauthenticated entry screen (login, register, activate).
pub const AUTH_PREFIX: &str = "/auth";
/// Prefix of administrator screens.
pub const ADMIN_PREFIX: &str = "/admin";
/// Prefix of onboarding-officer screens.
pub const OFFICER_PREFIX: &str = "/kyc-officer";

/// Login screen, the landing point for anonymous users.
pub const LOGIN_PATH: &str = "/auth/login";
/// Account activation screen.
pub const ACTIVATE_PATH: &str = "/auth/activate";
/// Administrator landing screen.
pub const ADMIN_DASHBOARD_PATH: &str = "/admin/dashboard";
/// Onboarding-officer landing screen.
pub const OFFICER_PATH: &str = "/kyc-officer";
/// KYC document upload screen.
pub const KYC_UPLOAD_PATH: &str = "/kyc-upload";
/// NDA acknowledgement screen.
pub const NDA_PATH: &str = "/nda-acknowledge";
/// Investor dashboard and generic fallback.
pub const DASHBOARD_PATH: &str = "/dashboard";
/// Own-profile screen, reachable from every gated state.
pub const PROFILE_PATH: &str = "/profile";

/// A landing route chosen by the authorization engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    /// `/auth/activate`
    Activate,
    /// `/admin/dashboard`
    AdminDashboard,
    /// `/kyc-officer`
    KycOfficer,
    /// `/kyc-upload`
    KycUpload,
    /// `/nda-acknowledge`
    NdaAcknowledge,
    /// `/dashboard`
    Dashboard,
}

impl Route {
    /// The screen path for this route.
    pub fn as_path(&self) -> &'static str {
        match self {
            Self::Activate => ACTIVATE_PATH,
            Self::AdminDashboard => ADMIN_DASHBOARD_PATH,
            Self::KycOfficer => OFFICER_PATH,
            Self::KycUpload => KYC_UPLOAD_PATH,
            Self::NdaAcknowledge => NDA_PATH,
            Self::Dashboard => DASHBOARD_PATH,
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_path())
    }
}

/// Whether `path` is `prefix` itself or nested below it.
///
/// Query strings and fragments are ignored.
pub fn is_under(path: &str, prefix: &str) -> bool {
    let path = strip_query(path);
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Whether `path` is an unauthenticated entry screen.
pub fn is_auth_path(path: &str) -> bool {
    is_under(path, AUTH_PREFIX)
}

/// Whether `path` is an administrator screen.
pub fn is_admin_path(path: &str) -> bool {
    is_under(path, ADMIN_PREFIX)
}

/// Whether `path` is an onboarding-officer screen.
pub fn is_officer_path(path: &str) -> bool {
    is_under(path, OFFICER_PREFIX)
}

/// Exact path comparison ignoring query, fragment and a trailing slash.
pub fn same_path(a: &str, b: &str) -> bool {
    normalize(a) == normalize(b)
}

fn strip_query(path: &str) -> &str {
    path.split(['?', '#']).next().unwrap_or(path)
}

fn normalize(path: &str) -> &str {
    let path = strip_query(path);
    if path.len() > 1 {
        path.trim_end_matches('/')
    } else {
        path
    }
}
