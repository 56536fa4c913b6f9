//! # portal-client -- Typed Rust client for the investor-portal profile service
//!
//! Provides the [`ProfileService`] contract the session layer depends on,
//! and [`HttpProfileClient`], its implementation over the portal backend's
//! REST API.
//!
//! ## Architecture
//!
//! This crate is the only path from the workspace to the profile service.
//! It never makes authorization decisions; it returns profiles and classified
//! errors ([`ErrorKind`]) and leaves the reaction to `portal-session`.
//!
//! ## API Path Convention
//!
//! All endpoints live under `{base_url}/api/v1/auth/`. For example:
//! `http://127.0.0.1:8000/api/v1/auth/me`.

pub mod config;
pub mod error;
pub mod http;
pub(crate) mod retry;
pub mod service;

pub use config::{ConfigError, PortalApiConfig};
pub use error::{ErrorKind, ProfileServiceError};
pub use http::HttpProfileClient;
pub use service::{
    AuthResponse, ForgotPasswordRequest, LoginRequest, MessageResponse, ProfileService,
    RegisterRequest, ResetPasswordRequest,
};
