//! Contract tests for HttpProfileClient against the portal auth API.
//!
//! These tests use wiremock to simulate the backend. Every path, request
//! shape and response shape mirrors the `/api/v1/auth` routes.
//!
//! | Method | Path | Test |
//! |--------|------|------|
//! | POST   | `/api/v1/auth/login` | `authenticate_*` |
//! | POST   | `/api/v1/auth/register` | `register_*` |
//! | GET    | `/api/v1/auth/me` | `fetch_profile_*` |
//! | POST   | `/api/v1/auth/logout` | `invalidate_*` |
//! | POST   | `/api/v1/auth/forgot-password` | `forgot_password_*` |
//! | POST   | `/api/v1/auth/reset-password` | `reset_password_*` |

use portal_client::{
    ErrorKind, ForgotPasswordRequest, HttpProfileClient, LoginRequest, PortalApiConfig,
    ProfileService, ProfileServiceError, RegisterRequest, ResetPasswordRequest,
};
use portal_core::{Credential, KycStatus, Role};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Build a client pointed at a wiremock server, retries disabled.
fn test_client(mock_server: &MockServer) -> HttpProfileClient {
    let mut config = PortalApiConfig::new(&mock_server.uri()).unwrap();
    config.timeout_secs = 5;
    config.max_retries = 0;
    HttpProfileClient::new(config).unwrap()
}

/// Client with a 1s timeout and `max_retries` transport retries.
fn retrying_client(mock_server: &MockServer, max_retries: u32) -> HttpProfileClient {
    let mut config = PortalApiConfig::new(&mock_server.uri()).unwrap();
    config.timeout_secs = 1;
    config.max_retries = max_retries;
    HttpProfileClient::new(config).unwrap()
}

fn investor_json() -> serde_json::Value {
    serde_json::json!({
        "id": 101,
        "email": "ada@example.com",
        "full_name": "Ada Lovelace",
        "role": "investor",
        "status": "active",
        "kyc_status": "not_submitted",
        "investment_stage": {"id": 1, "name": "PENDING_KYC", "display_name": "Pending KYC"},
        "activation_stage": {"stage": "completed", "requires_action": false, "is_expired": false},
        "nda_accepted": false
    })
}

// ── POST /api/v1/auth/login ──────────────────────────────────────────

#[tokio::test]
async fn authenticate_posts_credentials_and_returns_profile() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .and(body_json(serde_json::json!({
            "email": "ada@example.com",
            "password": "correct-horse"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "tok-abc",
            "token_type": "bearer",
            "user": investor_json()
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let resp = client
        .authenticate(&LoginRequest::new("ada@example.com", "correct-horse"))
        .await
        .unwrap();

    assert_eq!(resp.access_token.expose(), "tok-abc");
    assert_eq!(resp.user.email, "ada@example.com");
    assert_eq!(resp.user.role, Some(Role::Investor));
    assert_eq!(resp.user.kyc_status, Some(KycStatus::NotSubmitted));
}

#[tokio::test]
async fn authenticate_maps_401_to_invalid_credentials() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(serde_json::json!({"detail": "Incorrect email or password"})),
        )
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let err = client
        .authenticate(&LoginRequest::new("ada@example.com", "wrong"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ValidationFailure);
    assert_eq!(err.user_message(), "Incorrect email or password");
}

// ── POST /api/v1/auth/register ───────────────────────────────────────

#[tokio::test]
async fn register_omits_confirmation_and_returns_unactivated_profile() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/register"))
        .and(body_json(serde_json::json!({
            "email": "new@example.com",
            "password": "correct-horse",
            "full_name": "New Investor"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "access_token": "tok-new",
            "user": {
                "id": "u-9",
                "email": "new@example.com",
                "full_name": "New Investor",
                "role": "investor",
                "activation_stage": {"stage": "pending_email", "requires_action": true}
            }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let resp = client
        .register(&RegisterRequest {
            email: "new@example.com".into(),
            password: "correct-horse".into(),
            confirm_password: "correct-horse".into(),
            full_name: "New Investor".into(),
            phone: None,
        })
        .await
        .unwrap();

    assert_eq!(resp.user.id.as_str(), "u-9");
    assert!(resp.user.needs_activation());
}

#[tokio::test]
async fn register_conflict_is_validation_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/register"))
        .respond_with(
            ResponseTemplate::new(409)
                .set_body_json(serde_json::json!({"detail": "Email already registered"})),
        )
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let err = client
        .register(&RegisterRequest {
            email: "dup@example.com".into(),
            password: "correct-horse".into(),
            confirm_password: "correct-horse".into(),
            full_name: "Dup".into(),
            phone: None,
        })
        .await
        .unwrap_err();

    match err {
        ProfileServiceError::Validation(msg) => assert_eq!(msg, "Email already registered"),
        other => panic!("expected Validation, got: {other:?}"),
    }
}

#[tokio::test]
async fn register_timeout_is_sent_once() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/register"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(serde_json::json!({
                    "access_token": "tok-slow",
                    "user": investor_json()
                }))
                .set_delay(std::time::Duration::from_millis(1500)),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = retrying_client(&mock_server, 2);
    let err = client
        .register(&RegisterRequest {
            email: "slow@example.com".into(),
            password: "correct-horse".into(),
            confirm_password: "correct-horse".into(),
            full_name: "Slow Network".into(),
            phone: None,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, ProfileServiceError::Http { .. }), "got {err:?}");
    assert_eq!(err.kind(), ErrorKind::NetworkFailure);
}

#[tokio::test]
async fn authenticate_timeout_is_sent_once() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({
                    "access_token": "tok-slow",
                    "user": investor_json()
                }))
                .set_delay(std::time::Duration::from_millis(1500)),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = retrying_client(&mock_server, 2);
    let err = client
        .authenticate(&LoginRequest::new("ada@example.com", "correct-horse"))
        .await
        .unwrap_err();
    assert!(matches!(err, ProfileServiceError::Http { .. }), "got {err:?}");
}

// ── GET /api/v1/auth/me ──────────────────────────────────────────────

#[tokio::test]
async fn fetch_profile_sends_bearer_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/auth/me"))
        .and(header("authorization", "Bearer tok-abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(investor_json()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let profile = client
        .fetch_profile(&Credential::new("tok-abc"))
        .await
        .unwrap();

    assert_eq!(profile.id.as_str(), "101");
    assert_eq!(profile.nda_accepted, Some(false));
}

#[tokio::test]
async fn fetch_profile_maps_401_to_unauthorized() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/auth/me"))
        .respond_with(ResponseTemplate::new(401).set_body_string("expired"))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let err = client
        .fetch_profile(&Credential::new("stale"))
        .await
        .unwrap_err();
    assert!(err.is_unauthorized(), "got {err:?}");
}

#[tokio::test]
async fn fetch_profile_server_error_is_network_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/auth/me"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let err = client
        .fetch_profile(&Credential::new("tok"))
        .await
        .unwrap_err();

    match &err {
        ProfileServiceError::Api { status, body, .. } => {
            assert_eq!(*status, 503);
            assert_eq!(body, "maintenance");
        }
        other => panic!("expected Api, got: {other:?}"),
    }
    assert_eq!(err.kind(), ErrorKind::NetworkFailure);
}

#[tokio::test]
async fn fetch_profile_malformed_body_is_deserialization_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/auth/me"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let err = client
        .fetch_profile(&Credential::new("tok"))
        .await
        .unwrap_err();
    assert!(matches!(err, ProfileServiceError::Deserialization { .. }));
}

#[tokio::test]
async fn fetch_profile_timeout_is_http_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/auth/me"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(investor_json())
                .set_delay(std::time::Duration::from_secs(3)),
        )
        .mount(&mock_server)
        .await;

    let mut config = PortalApiConfig::new(&mock_server.uri()).unwrap();
    config.timeout_secs = 1;
    config.max_retries = 0;
    let client = HttpProfileClient::new(config).unwrap();

    let err = client
        .fetch_profile(&Credential::new("tok"))
        .await
        .unwrap_err();
    assert!(matches!(err, ProfileServiceError::Http { .. }), "got {err:?}");
    assert_eq!(err.kind(), ErrorKind::NetworkFailure);
}

#[tokio::test]
async fn fetch_profile_timeout_is_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/auth/me"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(investor_json())
                .set_delay(std::time::Duration::from_millis(1500)),
        )
        .expect(2)
        .mount(&mock_server)
        .await;

    let client = retrying_client(&mock_server, 1);
    let err = client
        .fetch_profile(&Credential::new("tok"))
        .await
        .unwrap_err();
    assert!(matches!(err, ProfileServiceError::Http { .. }), "got {err:?}");
}

// ── POST /api/v1/auth/logout ─────────────────────────────────────────

#[tokio::test]
async fn invalidate_posts_with_bearer_and_accepts_204() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/logout"))
        .and(header("authorization", "Bearer tok-abc"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    client.invalidate(&Credential::new("tok-abc")).await.unwrap();
}

#[tokio::test]
async fn invalidate_accepts_json_acknowledgement() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/logout"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"message": "Logged out"})),
        )
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    client.invalidate(&Credential::new("tok")).await.unwrap();
}

// ── Password reset ───────────────────────────────────────────────────

#[tokio::test]
async fn forgot_password_returns_message() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/forgot-password"))
        .and(body_json(serde_json::json!({"email": "ada@example.com"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "message": "If the account exists, a reset link was sent"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let resp = client
        .forgot_password(&ForgotPasswordRequest {
            email: "ada@example.com".into(),
        })
        .await
        .unwrap();
    assert!(resp.message.contains("reset link"));
}

#[tokio::test]
async fn reset_password_rejected_token_is_validation_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/reset-password"))
        .and(body_json(serde_json::json!({
            "token": "expired-token",
            "new_password": "correct-horse"
        })))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(serde_json::json!({"detail": "Reset token has expired"})),
        )
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let err = client
        .reset_password(&ResetPasswordRequest {
            token: "expired-token".into(),
            new_password: "correct-horse".into(),
            confirm_password: "correct-horse".into(),
        })
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ValidationFailure);
    assert_eq!(err.user_message(), "Reset token has expired");
}
