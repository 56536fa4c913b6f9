#![deny(missing_docs)]

//! # portal-core -- Foundational Types for the Investor Portal
//!
//! This crate defines the types every other crate in the workspace depends
//! on, plus the pure authorization decision engine. It performs no I/O and
//! has no internal crate dependencies.
//!
//! ## Design Principles
//!
//! 1. **Whole-snapshot profiles.** An [`AccountProfile`] is an immutable value.
//!    Updates replace it wholesale; nothing in the workspace mutates a single
//!    field of a live profile.
//!
//! 2. **Typed account dimensions.** Role, account status and KYC status are
//!    enums with a forward-compatible catch-all, so an unexpected wire value
//!    degrades to `Unknown` instead of failing the whole decode.
//!
//! 3. **Opaque credentials.** A [`Credential`] is never parsed. It is zeroized
//!    on drop and redacted from `Debug` output.
//!
//! 4. **Pure access decisions.** [`access`] maps a profile (and optionally a
//!    path) to a landing route or an access boolean. Same input, same output.

pub mod access;
pub mod credential;
pub mod error;
pub mod profile;
pub mod routes;

// Re-export primary types at crate root for ergonomic imports.
pub use access::{
    can_access_route, intended_route, post_login_redirect, should_redirect_from_path,
};
pub use credential::Credential;
pub use error::ValidationError;
pub use profile::{
    AccountProfile, AccountStatus, ActivationStage, InvestmentStage, KycStatus, RecordId, Role,
};
pub use routes::Route;
