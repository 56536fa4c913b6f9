//! # Session Manager
//!
//! Owns the [`SessionState`] and is the only thing that mutates it.
//!
//! ## Concurrency
//!
//! Every operation suspends only at the profile-service call. Local
//! mutation before and after that call goes through `commit`, which runs
//! under a single transition lock. It applies the change,
//! re-derives `is_authenticated`, releases the state lock and broadcasts the
//! resulting snapshot to listeners in registration order. No lock is held
//! across `.await`.
//!
//! Initialization runs at most once per manager. The attempt is spawned
//! onto the runtime and its outcome published on a `tokio::sync::watch`
//! channel, so concurrent callers share it and a caller that gives up
//! (timeout, dropped future) does not leave the session stuck loading.
//!
//! A credential epoch is bumped whenever the credential changes (sign-in,
//! logout, discard). Initialize and refresh capture it before calling out
//! and drop their response if it moved, so a `logout()` issued during a
//! refresh cannot be undone by the refresh landing afterwards.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, ReentrantMutex, RwLock};
use portal_client::{
    AuthResponse, ForgotPasswordRequest, HttpProfileClient, LoginRequest, MessageResponse,
    PortalApiConfig, ProfileService, ProfileServiceError, RegisterRequest, ResetPasswordRequest,
};
use portal_core::{AccountProfile, Credential, ValidationError};
use tokio::sync::watch;

use crate::error::SessionError;
use crate::guard::{self, GuardDecision};
use crate::state::{SessionPhase, SessionState};
use crate::store::CredentialStore;
use crate::subscription::{Listener, ListenerRegistry, Subscription};

struct Inner {
    service: Arc<dyn ProfileService>,
    store: Arc<dyn CredentialStore>,
    state: RwLock<SessionState>,
    listeners: Arc<Mutex<ListenerRegistry>>,
    // Serialises commit + broadcast. Re-entrant so a listener may subscribe
    // from inside its callback.
    transition: ReentrantMutex<()>,
    epoch: AtomicU64,
    // In-memory copy of the active credential, used by refresh and logout.
    credential: Mutex<Option<Credential>>,
    init_started: AtomicBool,
    // `None` until the initialization attempt has settled.
    init: watch::Sender<Option<SessionState>>,
}

impl Inner {
    fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    fn bump_epoch(&self) -> u64 {
        self.epoch.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn persist(&self, credential: &Credential) {
        if let Err(e) = self.store.set(credential) {
            tracing::warn!(
                error = %e,
                "failed to persist credential; session will not survive restart"
            );
        }
    }

    fn forget(&self) {
        if let Err(e) = self.store.clear() {
            tracing::warn!(error = %e, "failed to clear stored credential");
        }
    }
}

/// The session state machine.
///
/// Cheap to clone; clones share one session. Construct one per application
/// root and hand clones to whatever needs it.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.read();
        f.debug_struct("SessionManager")
            .field("phase", &state.phase)
            .field("is_authenticated", &state.is_authenticated)
            .field("initialized", &state.initialized)
            .field("epoch", &self.inner.epoch())
            .finish()
    }
}

impl SessionManager {
    /// Create a manager over `service` and `store`. Nothing is read until
    /// [`initialize`](Self::initialize) runs.
    pub fn new(service: Arc<dyn ProfileService>, store: Arc<dyn CredentialStore>) -> Self {
        Self {
            inner: Arc::new(Inner {
                service,
                store,
                state: RwLock::new(SessionState::initial()),
                listeners: Arc::new(Mutex::new(ListenerRegistry::default())),
                transition: ReentrantMutex::new(()),
                epoch: AtomicU64::new(0),
                credential: Mutex::new(None),
                init_started: AtomicBool::new(false),
                init: watch::channel(None).0,
            }),
        }
    }

    /// Create a manager talking HTTP to the portal backend described by `config`.
    pub fn with_http(
        config: PortalApiConfig,
        store: Arc<dyn CredentialStore>,
    ) -> Result<Self, ProfileServiceError> {
        let client = HttpProfileClient::new(config)?;
        Ok(Self::new(Arc::new(client), store))
    }

    // -- Reads ----------------------------------------------------------------

    /// Current snapshot.
    pub fn state(&self) -> SessionState {
        self.inner.state.read().clone()
    }

    /// Signed-in profile, if any.
    pub fn current_user(&self) -> Option<AccountProfile> {
        self.inner.state.read().user.clone()
    }

    /// Signed-in profile, or [`SessionError::NotAuthenticated`].
    pub fn require_user(&self) -> Result<AccountProfile, SessionError> {
        self.current_user().ok_or(SessionError::NotAuthenticated)
    }

    /// Whether a user is signed in.
    pub fn is_authenticated(&self) -> bool {
        self.inner.state.read().is_authenticated
    }

    /// Route-guard decision for `path` against the current snapshot.
    pub fn guard(&self, path: &str) -> GuardDecision {
        guard::evaluate(&self.state(), path)
    }

    // -- Subscriptions --------------------------------------------------------

    /// Register `listener`. It is called immediately with the current state
    /// and then once per transition, in registration order.
    ///
    /// Listeners run synchronously on the thread that committed the
    /// transition. They may read [`state`](Self::state) and subscribe or
    /// unsubscribe, but must not start session operations inline.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&SessionState) + Send + Sync + 'static,
    {
        let listener: Listener = Arc::new(listener);
        let _transition = self.inner.transition.lock();
        let id = self.inner.listeners.lock().insert(Arc::clone(&listener));
        let current = self.state();
        listener(&current);
        Subscription::new(id, &self.inner.listeners)
    }

    /// Number of registered listeners.
    pub fn subscriber_count(&self) -> usize {
        self.inner.listeners.lock().len()
    }

    // -- Transitions ----------------------------------------------------------

    /// Apply `f` and broadcast the result.
    ///
    /// With `expected_epoch` set, nothing happens (and `None` is returned)
    /// unless the credential epoch still matches.
    fn commit(
        &self,
        expected_epoch: Option<u64>,
        f: impl FnOnce(&Inner, &mut SessionState),
    ) -> Option<SessionState> {
        let _transition = self.inner.transition.lock();
        if let Some(expected) = expected_epoch {
            if self.inner.epoch() != expected {
                return None;
            }
        }
        let snapshot = {
            let mut state = self.inner.state.write();
            f(&self.inner, &mut state);
            state.sync_authenticated();
            state.clone()
        };
        let listeners = self.inner.listeners.lock().snapshot();
        for listener in listeners {
            listener(&snapshot);
        }
        Some(snapshot)
    }

    /// Like [`commit`](Self::commit) without an epoch check.
    fn apply(&self, f: impl FnOnce(&Inner, &mut SessionState)) -> SessionState {
        let _transition = self.inner.transition.lock();
        match self.commit(None, f) {
            Some(snapshot) => snapshot,
            None => self.state(),
        }
    }

    // -- Initialization -------------------------------------------------------

    /// Restore the session from the credential store.
    ///
    /// The first call reads the store and, if a credential is present,
    /// validates it against the profile service. Any failure clears the
    /// stored credential and leaves the session anonymous. Concurrent and
    /// later callers receive the same outcome without another remote call.
    ///
    /// The attempt runs on its own task and completes even if this future
    /// is dropped. Must be called from within a Tokio runtime.
    pub async fn initialize(&self) -> SessionState {
        let mut outcome = self.inner.init.subscribe();
        if !self.inner.init_started.swap(true, Ordering::SeqCst) {
            self.spawn_initialize();
        }
        let settled = outcome
            .wait_for(Option::is_some)
            .await
            .map(|settled| (*settled).clone());
        match settled {
            Ok(Some(state)) => state,
            _ => self.state(),
        }
    }

    fn spawn_initialize(&self) {
        let session = self.clone();
        tokio::spawn(async move {
            let attempt = tokio::spawn({
                let session = session.clone();
                async move { session.run_initialize().await }
            });
            let outcome = match attempt.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!(error = %e, "initialization task failed; starting anonymous");
                    session.apply(|_, s| {
                        s.initialized = true;
                        s.loading = false;
                        s.phase = s.resting_phase();
                    })
                }
            };
            session.inner.init.send_replace(Some(outcome));
        });
    }

    async fn run_initialize(&self) -> SessionState {
        let mut epoch = 0;
        self.apply(|inner, s| {
            epoch = inner.epoch();
            if s.phase == SessionPhase::Uninitialized {
                s.phase = SessionPhase::Initializing;
            }
            s.loading = true;
        });

        let stored = match self.inner.store.get() {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!(error = %e, "credential store unreadable; starting anonymous");
                self.inner.forget();
                None
            }
        };

        let Some(credential) = stored else {
            tracing::info!("no stored credential; session is anonymous");
            return self.apply(|_, s| {
                s.initialized = true;
                s.loading = false;
                s.phase = s.resting_phase();
            });
        };

        let result = self.inner.service.fetch_profile(&credential).await;
        let committed = match result {
            Ok(profile) => self.commit(Some(epoch), |inner, s| {
                tracing::info!(user_id = %profile.id, "session restored from stored credential");
                *inner.credential.lock() = Some(credential);
                s.user = Some(profile);
                s.error = None;
                s.initialized = true;
                s.loading = false;
                s.phase = SessionPhase::Authenticated;
            }),
            // Every failure during initialization discards the credential so
            // the session cannot stay stuck loading.
            Err(e) => self.commit(Some(epoch), |inner, s| {
                tracing::warn!(
                    error = %e,
                    kind = ?e.kind(),
                    "stored credential rejected; starting anonymous"
                );
                *inner.credential.lock() = None;
                inner.bump_epoch();
                inner.forget();
                s.user = None;
                s.initialized = true;
                s.loading = false;
                s.phase = SessionPhase::Anonymous;
            }),
        };

        committed.unwrap_or_else(|| {
            tracing::debug!("credential changed during initialization; discarding profile fetch");
            self.apply(|_, s| s.initialized = true)
        })
    }

    // -- Sign-in --------------------------------------------------------------

    /// Sign in with email and password.
    ///
    /// On failure `error` is set and the current user, if any, is kept.
    pub async fn login(&self, request: &LoginRequest) -> SessionState {
        if let Err(e) = request.validate() {
            return self.reject(e);
        }
        self.begin_authenticating();
        let result = self.inner.service.authenticate(request).await;
        self.finish_authenticating("login", result)
    }

    /// Create an account and sign in to it.
    pub async fn register(&self, request: &RegisterRequest) -> SessionState {
        if let Err(e) = request.validate() {
            return self.reject(e);
        }
        self.begin_authenticating();
        let result = self.inner.service.register(request).await;
        self.finish_authenticating("register", result)
    }

    fn reject(&self, err: ValidationError) -> SessionState {
        tracing::debug!(error = %err, "sign-in input rejected locally");
        self.apply(|_, s| s.error = Some(err.to_string()))
    }

    fn begin_authenticating(&self) {
        self.apply(|_, s| {
            s.loading = true;
            s.error = None;
            s.phase = SessionPhase::Authenticating;
        });
    }

    fn finish_authenticating(
        &self,
        operation: &'static str,
        result: Result<AuthResponse, ProfileServiceError>,
    ) -> SessionState {
        match result {
            Ok(AuthResponse {
                access_token, user, ..
            }) => self.apply(|inner, s| {
                tracing::info!(operation, user_id = %user.id, "signed in");
                inner.persist(&access_token);
                inner.bump_epoch();
                *inner.credential.lock() = Some(access_token);
                s.user = Some(user);
                s.error = None;
                s.loading = false;
                s.phase = SessionPhase::Authenticated;
            }),
            Err(e) => self.apply(|_, s| {
                tracing::warn!(operation, error = %e, kind = ?e.kind(), "sign-in failed");
                s.error = Some(e.user_message());
                s.loading = false;
                s.phase = s.resting_phase();
            }),
        }
    }

    // -- Sign-out -------------------------------------------------------------

    /// Sign out. Never fails.
    ///
    /// Local state and the stored credential are cleared first; the
    /// server-side invalidation that follows is best-effort.
    pub async fn logout(&self) {
        let credential = self.end_session("logout");
        self.invalidate_remote(credential).await;
    }

    /// Best-effort server-side invalidation after the session already ended.
    async fn invalidate_remote(&self, credential: Option<Credential>) {
        let Some(credential) = credential else {
            return;
        };
        if let Err(e) = self.inner.service.invalidate(&credential).await {
            tracing::warn!(error = %e, "remote logout failed; local session already cleared");
        }
    }

    /// Drop the session locally and return the credential it held.
    fn end_session(&self, reason: &'static str) -> Option<Credential> {
        let mut taken = None;
        self.apply(|inner, s| {
            taken = inner.credential.lock().take();
            if taken.is_none() {
                taken = inner.store.get().ok().flatten();
            }
            inner.bump_epoch();
            inner.forget();
            tracing::info!(reason, "session ended");
            s.user = None;
            s.error = None;
            s.loading = false;
            s.phase = SessionPhase::Anonymous;
        });
        taken
    }

    // -- Refresh --------------------------------------------------------------

    /// Re-fetch the signed-in profile.
    ///
    /// Does nothing when anonymous. A rejected credential ends the session
    /// and is invalidated remotely like a logout. Other failures set `error`
    /// and keep the current profile. A response that arrives after the
    /// credential changed is discarded.
    pub async fn refresh_user(&self) -> SessionState {
        let Some((epoch, credential)) = self.begin_refresh() else {
            return self.state();
        };

        let result = self.inner.service.fetch_profile(&credential).await;
        let committed = match result {
            Ok(profile) => self.commit(Some(epoch), |_, s| {
                tracing::debug!(user_id = %profile.id, "profile refreshed");
                s.user = Some(profile);
                s.error = None;
                s.phase = SessionPhase::Authenticated;
            }),
            Err(e) if e.is_unauthorized() => {
                let ended = {
                    let _transition = self.inner.transition.lock();
                    if self.inner.epoch() == epoch {
                        tracing::warn!("credential rejected during refresh");
                        Some(self.end_session("credential expired"))
                    } else {
                        None
                    }
                };
                match ended {
                    Some(credential) => {
                        self.invalidate_remote(credential).await;
                        Some(self.state())
                    }
                    None => None,
                }
            }
            Err(e) => self.commit(Some(epoch), |_, s| {
                tracing::warn!(error = %e, kind = ?e.kind(), "profile refresh failed");
                s.error = Some(e.user_message());
                s.phase = s.resting_phase();
            }),
        };

        committed.unwrap_or_else(|| {
            tracing::debug!("credential changed during refresh; discarding response");
            self.state()
        })
    }

    fn begin_refresh(&self) -> Option<(u64, Credential)> {
        let _transition = self.inner.transition.lock();
        if !self.inner.state.read().is_authenticated {
            return None;
        }
        let credential = self.inner.credential.lock().clone();
        let credential = match credential {
            Some(c) => c,
            None => match self.inner.store.get() {
                Ok(Some(c)) => c,
                Ok(None) => return None,
                Err(e) => {
                    tracing::warn!(error = %e, "no credential available for refresh");
                    return None;
                }
            },
        };
        let epoch = self.inner.epoch();
        self.apply(|_, s| s.phase = SessionPhase::Refreshing);
        Some((epoch, credential))
    }

    // -- Errors ---------------------------------------------------------------

    /// Dismiss the current error. Listeners are only notified if one was set.
    pub fn clear_error(&self) {
        let _transition = self.inner.transition.lock();
        if self.inner.state.read().error.is_none() {
            return;
        }
        self.apply(|_, s| s.error = None);
    }

    // -- Password reset -------------------------------------------------------

    /// Ask the service to email a reset link. Session state is untouched.
    pub async fn forgot_password(
        &self,
        request: &ForgotPasswordRequest,
    ) -> Result<MessageResponse, SessionError> {
        request.validate()?;
        Ok(self.inner.service.forgot_password(request).await?)
    }

    /// Complete a password reset. Session state is untouched.
    pub async fn reset_password(
        &self,
        request: &ResetPasswordRequest,
    ) -> Result<MessageResponse, SessionError> {
        request.validate()?;
        Ok(self.inner.service.reset_password(request).await?)
    }
}
