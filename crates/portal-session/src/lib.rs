//! # portal-session -- Session lifecycle for the investor portal
//!
//! The single source of truth for "who is signed in". A [`SessionManager`]
//! restores the session from a [`CredentialStore`] at start-up, drives
//! login, registration, refresh and logout against a
//! [`portal_client::ProfileService`], and broadcasts every transition to
//! subscribers as a complete [`SessionState`] snapshot.
//!
//! ## Guarantees
//!
//! - `is_authenticated` always equals `user.is_some()`.
//! - `initialized` flips to `true` once per manager, when the first
//!   initialization attempt ends.
//! - Concurrent `initialize()` calls share one profile fetch.
//! - Subscribers see every transition in the same order with the same
//!   snapshot.
//! - A response fetched under a credential that has since been replaced or
//!   cleared is never applied.
//!
//! Session operations do not return errors. Failures land in
//! [`SessionState::error`]; only the password-reset pass-throughs and
//! [`SessionManager::require_user`] return [`SessionError`].
//!
//! ## Route guards
//!
//! [`guard::evaluate`] combines a snapshot with the decision engine in
//! `portal_core::access` to tell a router whether to wait, render or
//! redirect.

pub mod error;
pub mod guard;
pub mod manager;
pub mod state;
pub mod store;
pub mod subscription;

pub use error::{CredentialStoreError, SessionError};
pub use guard::GuardDecision;
pub use manager::SessionManager;
pub use state::{SessionPhase, SessionState};
pub use store::{CredentialStore, FileCredentialStore, MemoryCredentialStore, CREDENTIAL_KEY};
pub use subscription::{Listener, Subscription};
