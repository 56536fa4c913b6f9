//! # HTTP Profile Client
//!
//! [`ProfileService`] over the portal backend's REST API.
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | POST   | `/api/v1/auth/login` | authenticate |
//! | POST   | `/api/v1/auth/register` | register |
//! | GET    | `/api/v1/auth/me` | fetch profile (Bearer) |
//! | POST   | `/api/v1/auth/logout` | invalidate (Bearer) |
//! | POST   | `/api/v1/auth/forgot-password` | request reset email |
//! | POST   | `/api/v1/auth/reset-password` | complete reset |
//!
//! ## Status Mapping
//!
//! - 401/403 on a Bearer call → [`ProfileServiceError::Unauthorized`]
//! - 401 on login/register → [`ProfileServiceError::InvalidCredentials`]
//! - 400/409/422 → [`ProfileServiceError::Validation`] with the server's message
//! - anything else non-2xx → [`ProfileServiceError::Api`]
//!
//! ## Retries
//!
//! Only `GET /me` is retried on transport errors. Every POST is sent exactly
//! once, so a timeout surfaces as an ordinary [`ProfileServiceError::Http`].

use std::time::Duration;

use async_trait::async_trait;
use portal_core::{AccountProfile, Credential};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::config::PortalApiConfig;
use crate::error::ProfileServiceError;
use crate::service::{
    AuthResponse, ForgotPasswordRequest, LoginRequest, MessageResponse, ProfileService,
    RegisterRequest, ResetPasswordRequest,
};

/// API version path for authentication endpoints.
const AUTH_API_PREFIX: &str = "api/v1/auth";

/// How a non-2xx status should be interpreted for a given endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Surface {
    /// Credential-bearing call: 401/403 means the session is gone.
    Session,
    /// Sign-in style call: 401 means the supplied credentials are wrong.
    SignIn,
    /// Anonymous call with no credential semantics.
    Public,
}

/// Client for the portal profile service.
#[derive(Debug, Clone)]
pub struct HttpProfileClient {
    http: reqwest::Client,
    base_url: url::Url,
    max_retries: u32,
}

impl HttpProfileClient {
    /// Create a new client from configuration.
    pub fn new(config: PortalApiConfig) -> Result<Self, ProfileServiceError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ProfileServiceError::Http {
                endpoint: "client_init".into(),
                source: e,
            })?;

        Ok(Self {
            http,
            base_url: config.base_url,
            max_retries: config.max_retries,
        })
    }

    /// Create a client from `PORTAL_*` environment variables.
    pub fn from_env() -> Result<Self, ProfileServiceError> {
        Self::new(PortalApiConfig::from_env()?)
    }

    /// The configured base URL.
    pub fn base_url(&self) -> &url::Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{AUTH_API_PREFIX}/{path}", self.base_url)
    }

    async fn post_json<B, T>(
        &self,
        path: &str,
        body: &B,
        credential: Option<&Credential>,
        surface: Surface,
    ) -> Result<T, ProfileServiceError>
    where
        B: serde::Serialize + Sync,
        T: DeserializeOwned,
    {
        let endpoint = format!("POST /auth/{path}");
        let url = self.url(path);

        // POSTs are not idempotent: a timed-out registration may already
        // have been accepted. Send once and let the caller decide.
        let mut req = self.http.post(&url).json(body);
        if let Some(c) = credential {
            req = req.bearer_auth(c.expose());
        }
        let resp = req.send().await.map_err(|e| ProfileServiceError::Http {
            endpoint: endpoint.clone(),
            source: e,
        })?;

        decode(endpoint, resp, surface).await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        credential: &Credential,
    ) -> Result<T, ProfileServiceError> {
        let endpoint = format!("GET /auth/{path}");
        let url = self.url(path);

        let resp = crate::retry::retry_send(self.max_retries, || {
            self.http.get(&url).bearer_auth(credential.expose()).send()
        })
        .await
        .map_err(|e| ProfileServiceError::Http {
            endpoint: endpoint.clone(),
            source: e,
        })?;

        decode(endpoint, resp, Surface::Session).await
    }
}

#[async_trait]
impl ProfileService for HttpProfileClient {
    async fn authenticate(&self, req: &LoginRequest) -> Result<AuthResponse, ProfileServiceError> {
        self.post_json("login", req, None, Surface::SignIn).await
    }

    async fn register(&self, req: &RegisterRequest) -> Result<AuthResponse, ProfileServiceError> {
        self.post_json("register", req, None, Surface::SignIn).await
    }

    async fn fetch_profile(
        &self,
        credential: &Credential,
    ) -> Result<AccountProfile, ProfileServiceError> {
        self.get_json("me", credential).await
    }

    async fn invalidate(&self, credential: &Credential) -> Result<(), ProfileServiceError> {
        let _: serde_json::Value = self
            .post_json(
                "logout",
                &serde_json::json!({}),
                Some(credential),
                Surface::Session,
            )
            .await?;
        Ok(())
    }

    async fn forgot_password(
        &self,
        req: &ForgotPasswordRequest,
    ) -> Result<MessageResponse, ProfileServiceError> {
        self.post_json("forgot-password", req, None, Surface::Public)
            .await
    }

    async fn reset_password(
        &self,
        req: &ResetPasswordRequest,
    ) -> Result<MessageResponse, ProfileServiceError> {
        self.post_json("reset-password", req, None, Surface::Public)
            .await
    }
}

async fn decode<T: DeserializeOwned>(
    endpoint: String,
    resp: reqwest::Response,
    surface: Surface,
) -> Result<T, ProfileServiceError> {
    let status = resp.status();
    if status.is_success() {
        // Logout and similar endpoints may answer 204 with no body.
        if status == StatusCode::NO_CONTENT {
            return serde_json::from_value(serde_json::Value::Null).map_err(|_| {
                ProfileServiceError::Api {
                    endpoint,
                    status: status.as_u16(),
                    body: String::new(),
                }
            });
        }
        return resp
            .json()
            .await
            .map_err(|e| ProfileServiceError::Deserialization { endpoint, source: e });
    }

    let body = resp.text().await.unwrap_or_default();
    Err(classify_status(endpoint, status, body, surface))
}

fn classify_status(
    endpoint: String,
    status: StatusCode,
    body: String,
    surface: Surface,
) -> ProfileServiceError {
    match (status, surface) {
        (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN, Surface::Session) => {
            ProfileServiceError::Unauthorized { endpoint }
        }
        (StatusCode::UNAUTHORIZED, Surface::SignIn) => ProfileServiceError::InvalidCredentials(
            server_message(&body).unwrap_or_else(|| "Incorrect email or password".to_string()),
        ),
        (StatusCode::BAD_REQUEST | StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY, _) => {
            ProfileServiceError::Validation(
                server_message(&body).unwrap_or_else(|| "The request was rejected".to_string()),
            )
        }
        _ => ProfileServiceError::Api {
            endpoint,
            status: status.as_u16(),
            body,
        },
    }
}

/// Pull a human-readable message out of an error body.
///
/// Understands `{"detail": "..."}`, `{"detail": [{"msg": "..."}]}`,
/// `{"message": "..."}` and `{"error": "..."}`.
fn server_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    for key in ["detail", "message", "error"] {
        match value.get(key) {
            Some(serde_json::Value::String(s)) if !s.is_empty() => return Some(s.clone()),
            Some(serde_json::Value::Array(items)) => {
                let msgs: Vec<&str> = items
                    .iter()
                    .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                    .collect();
                if !msgs.is_empty() {
                    return Some(msgs.join("; "));
                }
            }
            _ => {}
        }
    }
    None
}
