//! # Authorization Decision Engine
//!
//! Pure functions mapping an [`AccountProfile`] (and optionally the current
//! screen path) to a landing route or an access decision. No I/O, no state:
//! the same input always yields the same output. The only side effect is a
//! `tracing` warning when a profile arrives without a usable role.
//!
//! ## Landing Precedence
//!
//! First matching rule wins:
//!
//! ```text
//! 1. activation unfinished or requires action  → /auth/activate
//! 2. admin                                     → /admin/dashboard
//! 3. onboarding officer                        → /kyc-officer
//! 4. investor
//!    a. stage PENDING_KYC or KYC not submitted → /kyc-upload
//!    b. NDA explicitly not accepted            → /nda-acknowledge
//!    c. otherwise                              → /dashboard
//! 5. anything else                             → /dashboard
//! ```
//!
//! A missing role is never a crash; it lands on the dashboard where
//! [`can_access_route`] denies it anyway.

use crate::profile::{AccountProfile, Role};
use crate::routes::{
    is_admin_path, is_auth_path, is_officer_path, same_path, Route, ACTIVATE_PATH,
    DASHBOARD_PATH, KYC_UPLOAD_PATH, NDA_PATH, PROFILE_PATH,
};

/// Where `user` should land after signing in, as a typed [`Route`].
pub fn intended_route(user: &AccountProfile) -> Route {
    if user.needs_activation() {
        return Route::Activate;
    }

    match user.role {
        Some(Role::Admin) => Route::AdminDashboard,
        Some(Role::OnboardingOfficer) => Route::KycOfficer,
        Some(Role::Investor) => {
            if user.needs_kyc_upload() {
                Route::KycUpload
            } else if user.needs_nda() {
                Route::NdaAcknowledge
            } else {
                Route::Dashboard
            }
        }
        Some(Role::Guest) => Route::Dashboard,
        Some(Role::Unknown) | None => {
            tracing::warn!(
                user_id = %user.id,
                role = ?user.role,
                "profile has no recognised role, falling back to dashboard"
            );
            Route::Dashboard
        }
    }
}

/// Where `user` should land after signing in.
pub fn post_login_redirect(user: &AccountProfile) -> &'static str {
    intended_route(user).as_path()
}

/// Whether a user currently on `current_path` must be sent elsewhere.
///
/// The target is always [`post_login_redirect`]; this only answers whether
/// the current screen is wrong for the user's state.
pub fn should_redirect_from_path(user: &AccountProfile, current_path: &str) -> bool {
    let intended = post_login_redirect(user);
    if same_path(current_path, intended) {
        return false;
    }

    // Signed-in users never linger on login/register screens.
    if is_auth_path(current_path) {
        return true;
    }

    match user.role {
        Some(Role::Admin) => !is_admin_path(current_path),
        Some(Role::OnboardingOfficer) => !is_officer_path(current_path),
        Some(Role::Investor) => {
            if is_admin_path(current_path) || is_officer_path(current_path) {
                return true;
            }
            if user.needs_kyc_upload() && !same_path(current_path, KYC_UPLOAD_PATH) {
                return true;
            }
            user.needs_nda() && !same_path(current_path, NDA_PATH)
        }
        _ => false,
    }
}

/// Whether `user` may view `route`.
pub fn can_access_route(user: &AccountProfile, route: &str) -> bool {
    match user.role {
        Some(Role::Admin) => true,
        Some(Role::OnboardingOfficer) => {
            is_officer_path(route)
                || same_path(route, DASHBOARD_PATH)
                || same_path(route, PROFILE_PATH)
        }
        Some(Role::Investor) => investor_can_access(user, route),
        _ => false,
    }
}

fn investor_can_access(user: &AccountProfile, route: &str) -> bool {
    if is_admin_path(route) || is_officer_path(route) {
        return false;
    }

    if user.needs_activation() && !same_path(route, ACTIVATE_PATH) {
        return false;
    }

    let is_profile = same_path(route, PROFILE_PATH);
    let is_kyc_upload = same_path(route, KYC_UPLOAD_PATH);

    if user.needs_kyc_upload() && !(is_kyc_upload || is_auth_path(route) || is_profile) {
        return false;
    }

    if user.needs_nda()
        && !(same_path(route, NDA_PATH) || is_auth_path(route) || is_kyc_upload || is_profile)
    {
        return false;
    }

    true
}
