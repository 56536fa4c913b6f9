//! Shared fixtures for session tests: a scripted in-memory profile service
//! with call counters and a gate for holding a profile fetch in flight.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use portal_client::{
    AuthResponse, ForgotPasswordRequest, LoginRequest, MessageResponse, ProfileService,
    ProfileServiceError, RegisterRequest, ResetPasswordRequest,
};
use portal_core::{AccountProfile, ActivationStage, Credential, KycStatus, Role};
use portal_session::{CredentialStore, MemoryCredentialStore, SessionManager};
use tokio::sync::Notify;

pub const PASSWORD: &str = "correct-horse";
pub const VALID_RESET_TOKEN: &str = "reset-ok";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Holds a `fetch_profile` call after it has resolved the profile but
/// before it returns.
#[derive(Default)]
pub struct Gate {
    pub entered: Notify,
    pub release: Notify,
}

#[derive(Default)]
pub struct ScriptedService {
    users: Mutex<HashMap<String, (String, AccountProfile)>>,
    tokens: Mutex<HashMap<String, String>>,
    minted: AtomicUsize,
    gate: Mutex<Option<Arc<Gate>>>,
    fetch_delay: Mutex<Option<Duration>>,
    outage: AtomicBool,
    fail_invalidate: AtomicBool,
    pub authenticate_calls: AtomicUsize,
    pub register_calls: AtomicUsize,
    pub fetch_calls: AtomicUsize,
    pub invalidate_calls: AtomicUsize,
}

impl ScriptedService {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_user(&self, password: &str, profile: AccountProfile) {
        self.users
            .lock()
            .insert(profile.email.clone(), (password.to_string(), profile));
    }

    /// Replace the profile the service reports for `email`.
    pub fn set_profile(&self, profile: AccountProfile) {
        if let Some(entry) = self.users.lock().get_mut(&profile.email) {
            entry.1 = profile;
        }
    }

    /// Mint a valid credential for `email`, as if issued in an earlier run.
    pub fn issue_token(&self, email: &str) -> Credential {
        let n = self.minted.fetch_add(1, Ordering::SeqCst) + 1;
        let token = format!("tok-{n}");
        self.tokens.lock().insert(token.clone(), email.to_string());
        Credential::new(token)
    }

    /// Invalidate every credential issued for `email`.
    pub fn revoke_all(&self, email: &str) {
        self.tokens.lock().retain(|_, owner| owner != email);
    }

    pub fn set_gate(&self, gate: Option<Arc<Gate>>) {
        *self.gate.lock() = gate;
    }

    pub fn set_fetch_delay(&self, delay: Duration) {
        *self.fetch_delay.lock() = Some(delay);
    }

    pub fn set_outage(&self, down: bool) {
        self.outage.store(down, Ordering::SeqCst);
    }

    pub fn fail_invalidate(&self, fail: bool) {
        self.fail_invalidate.store(fail, Ordering::SeqCst);
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    fn unavailable(&self, endpoint: &str) -> Result<(), ProfileServiceError> {
        if self.outage.load(Ordering::SeqCst) {
            return Err(ProfileServiceError::Api {
                endpoint: endpoint.to_string(),
                status: 503,
                body: "maintenance".to_string(),
            });
        }
        Ok(())
    }

    fn sign_in(&self, profile: AccountProfile) -> AuthResponse {
        let access_token = self.issue_token(&profile.email);
        AuthResponse {
            access_token,
            token_type: "bearer".to_string(),
            user: profile,
        }
    }
}

#[async_trait]
impl ProfileService for ScriptedService {
    async fn authenticate(&self, req: &LoginRequest) -> Result<AuthResponse, ProfileServiceError> {
        self.authenticate_calls.fetch_add(1, Ordering::SeqCst);
        self.unavailable("POST /auth/login")?;
        let profile = {
            let users = self.users.lock();
            match users.get(&req.email) {
                Some((password, profile)) if *password == req.password => profile.clone(),
                _ => {
                    return Err(ProfileServiceError::InvalidCredentials(
                        "Incorrect email or password".to_string(),
                    ))
                }
            }
        };
        Ok(self.sign_in(profile))
    }

    async fn register(&self, req: &RegisterRequest) -> Result<AuthResponse, ProfileServiceError> {
        self.register_calls.fetch_add(1, Ordering::SeqCst);
        self.unavailable("POST /auth/register")?;
        if self.users.lock().contains_key(&req.email) {
            return Err(ProfileServiceError::Validation(
                "Email already registered".to_string(),
            ));
        }
        let id = format!("new-{}", self.users.lock().len() + 1);
        let profile = AccountProfile::new(id, req.email.clone(), req.full_name.clone())
            .with_role(Role::Investor)
            .with_kyc(KycStatus::NotSubmitted)
            .with_activation(ActivationStage::pending("pending_email"));
        self.add_user(&req.password, profile.clone());
        Ok(self.sign_in(profile))
    }

    async fn fetch_profile(
        &self,
        credential: &Credential,
    ) -> Result<AccountProfile, ProfileServiceError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.fetch_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.unavailable("GET /auth/me")?;

        let email = self.tokens.lock().get(credential.expose()).cloned();
        let profile = email.and_then(|email| {
            self.users
                .lock()
                .get(&email)
                .map(|(_, profile)| profile.clone())
        });

        let gate = self.gate.lock().clone();
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }

        profile.ok_or_else(|| ProfileServiceError::Unauthorized {
            endpoint: "GET /auth/me".to_string(),
        })
    }

    async fn invalidate(&self, credential: &Credential) -> Result<(), ProfileServiceError> {
        self.invalidate_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_invalidate.load(Ordering::SeqCst) {
            return Err(ProfileServiceError::Api {
                endpoint: "POST /auth/logout".to_string(),
                status: 500,
                body: String::new(),
            });
        }
        self.tokens.lock().remove(credential.expose());
        Ok(())
    }

    async fn forgot_password(
        &self,
        _req: &ForgotPasswordRequest,
    ) -> Result<MessageResponse, ProfileServiceError> {
        self.unavailable("POST /auth/forgot-password")?;
        Ok(MessageResponse {
            message: "If the account exists, a reset link was sent".to_string(),
        })
    }

    async fn reset_password(
        &self,
        req: &ResetPasswordRequest,
    ) -> Result<MessageResponse, ProfileServiceError> {
        self.unavailable("POST /auth/reset-password")?;
        if req.token != VALID_RESET_TOKEN {
            return Err(ProfileServiceError::Validation(
                "Reset token has expired".to_string(),
            ));
        }
        Ok(MessageResponse {
            message: "Password updated".to_string(),
        })
    }
}

// -- Profiles ---------------------------------------------------------------------

pub fn admin(email: &str) -> AccountProfile {
    AccountProfile::new("adm-1", email, "Grace Admin")
        .with_role(Role::Admin)
        .with_activation(ActivationStage::completed())
}

pub fn investor(email: &str) -> AccountProfile {
    AccountProfile::new("inv-1", email, "Ada Investor")
        .with_role(Role::Investor)
        .with_activation(ActivationStage::completed())
}

pub fn investor_ready(email: &str) -> AccountProfile {
    investor(email).with_kyc(KycStatus::Approved).with_nda(true)
}

// -- Managers ---------------------------------------------------------------------

pub fn manager_with(
    service: &Arc<ScriptedService>,
    store: Arc<dyn CredentialStore>,
) -> SessionManager {
    init_tracing();
    SessionManager::new(service.clone(), store)
}

pub fn manager(service: &Arc<ScriptedService>) -> (SessionManager, Arc<MemoryCredentialStore>) {
    let store = Arc::new(MemoryCredentialStore::new());
    (manager_with(service, store.clone()), store)
}

pub fn login(email: &str) -> LoginRequest {
    LoginRequest::new(email, PASSWORD)
}
