//! The session store: token persistence plus login/signup/logout.
//!
//! DESIGN
//! ======
//! State lives in a `watch` channel. Every commit mutates durable storage
//! inside `send_modify`, so storage and the published `Session` change in
//! one critical section and subscribers are woken after both are updated.
//!
//! `login` writes the fresh token to storage before fetching the profile.
//! If that fetch fails, storage is rolled back to whatever the published
//! session holds, so a rejected token never outlives the attempt.
//!
//! Startup hydration only commits if nothing else has claimed the session
//! while its profile fetch was in flight. A `logout` or `expire` bumps the
//! sign-out epoch, and a login that started before the bump is discarded.
//!
//! Removing a key that storage refuses to delete falls back to blanking it;
//! blank values read as absent, so a failed delete never restores a session.
//!
//! TRADE-OFFS
//! ==========
//! Concurrent logins are not deduplicated: each runs its own request chain
//! and the last one to commit wins, in memory and in storage alike.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tokio::sync::watch;

use super::{LoadingState, Session, SignupOutcome, SignupPolicy};
use crate::error::SessionError;
use crate::net::api::AuthApi;
use crate::net::types::{Credentials, SignupDetails, User};
use crate::storage::{DurableStorage, ROLE_HINT_KEY, SESSION_TOKEN_KEY, StorageError};

pub struct SessionStore {
    api: Arc<dyn AuthApi>,
    storage: Arc<dyn DurableStorage>,
    signup_policy: SignupPolicy,
    state: watch::Sender<Session>,
    hydrated: AtomicBool,
    /// Bumped by every sign-out; logins started under an older epoch are void.
    signed_out_epoch: AtomicU64,
}

impl SessionStore {
    #[must_use]
    pub fn new(api: Arc<dyn AuthApi>, storage: Arc<dyn DurableStorage>, signup_policy: SignupPolicy) -> Self {
        let (state, _) = watch::channel(Session::initializing());
        Self { api, storage, signup_policy, state, hydrated: AtomicBool::new(false), signed_out_epoch: AtomicU64::new(0) }
    }

    // =========================================================================
    // READ ACCESS
    // =========================================================================

    /// Clone of the current session.
    #[must_use]
    pub fn snapshot(&self) -> Session {
        self.state.borrow().clone()
    }

    /// Receiver that is notified on every session change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.state.borrow().token.clone()
    }

    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.state.borrow().user.clone()
    }

    #[must_use]
    pub fn signup_policy(&self) -> SignupPolicy {
        self.signup_policy
    }

    // =========================================================================
    // OPERATIONS
    // =========================================================================

    /// Hydrate the session from the persisted token.
    ///
    /// Always leaves the session `Ready`. A token the backend rejects (or any
    /// failure resolving it) is removed from storage. Calls after the first
    /// return the current snapshot without touching the network.
    pub async fn initialize(&self) -> Session {
        if self.hydrated.swap(true, Ordering::SeqCst) || self.snapshot().is_ready() {
            return self.snapshot();
        }

        let Some(token) = self.persisted_token() else {
            tracing::info!("no persisted session");
            self.mark_ready();
            return self.snapshot();
        };

        match self.api.fetch_current_user(&token).await {
            Ok(user) => {
                self.state.send_if_modified(|session| {
                    let unclaimed = session.token.is_none() && self.persisted_token().as_deref() == Some(token.as_str());
                    if unclaimed {
                        tracing::info!(user_id = user.id, role = %user.role, "session restored");
                        self.persist(&token, &user);
                        *session = Session::authenticated(token, user);
                        return true;
                    }
                    tracing::info!("session changed during hydration; dropping restored profile");
                    let was_initializing = !session.is_ready();
                    session.phase = LoadingState::Ready;
                    was_initializing
                });
            }
            Err(e) => {
                tracing::warn!(code = e.error_code(), error = %e, "persisted session rejected; clearing");
                self.state.send_modify(|session| {
                    if self.persisted_token().as_deref() == Some(token.as_str()) {
                        let _ = self.remove_persisted();
                    }
                    session.phase = LoadingState::Ready;
                });
            }
        }
        self.snapshot()
    }

    /// Authenticate, persist the token, resolve the profile and publish it.
    ///
    /// # Errors
    ///
    /// Returns the collaborator's error verbatim (`InvalidCredentials`,
    /// `Network`, ...), `Storage` if the token cannot be persisted, or
    /// `Cancelled` if a sign-out happened while the login was in flight. The
    /// published session is unchanged on every error path.
    pub async fn login(&self, credentials: &Credentials) -> Result<User, SessionError> {
        let epoch = self.signed_out_epoch.load(Ordering::SeqCst);
        let token = self
            .api
            .authenticate(credentials)
            .await
            .inspect_err(|e| tracing::info!(code = e.error_code(), "login rejected"))?
            .access_token;

        self.storage.set(SESSION_TOKEN_KEY, &token)?;

        match self.api.fetch_current_user(&token).await {
            Ok(user) => {
                if self.commit_since(epoch, token.clone(), user.clone()) {
                    tracing::info!(user_id = user.id, role = %user.role, "login succeeded");
                    Ok(user)
                } else {
                    tracing::info!("signed out while login was in flight; discarding");
                    self.rollback_pending(&token);
                    Err(SessionError::Cancelled)
                }
            }
            Err(e) => {
                tracing::warn!(code = e.error_code(), "profile fetch after login failed");
                self.rollback_pending(&token);
                Err(e)
            }
        }
    }

    /// Register an account; under [`SignupPolicy::AutoLogin`] also log in.
    ///
    /// # Errors
    ///
    /// Returns the registration error, or the login error when the account
    /// was created but auto-login failed. The session is unchanged on error.
    pub async fn signup(&self, details: &SignupDetails) -> Result<SignupOutcome, SessionError> {
        let registration = self
            .api
            .register(details)
            .await
            .inspect_err(|e| tracing::info!(code = e.error_code(), "signup rejected"))?;
        tracing::info!(user_id = registration.user_id, "account registered");

        match self.signup_policy {
            SignupPolicy::RequireLogin => Ok(SignupOutcome::Registered(registration)),
            SignupPolicy::AutoLogin => {
                let user = self.login(&details.credentials()).await?;
                Ok(SignupOutcome::LoggedIn(user))
            }
        }
    }

    /// Clear the session and persisted token. Never suspends.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if a persisted entry could be neither removed nor
    /// blanked. The in-memory session is cleared regardless.
    pub fn logout(&self) -> Result<(), SessionError> {
        tracing::info!("logout");
        self.clear().map_err(SessionError::from)
    }

    /// Global recovery after an `Unauthorized` response: same effect as
    /// [`logout`](Self::logout). Storage failures are logged.
    pub fn expire(&self) {
        tracing::warn!("session expired; clearing");
        if let Err(e) = self.clear() {
            tracing::error!(error = %e, "expired session left in storage");
        }
    }

    /// Route an authenticated call's result through the global recovery.
    ///
    /// `token` is the token the call was made with. An `Unauthorized` only
    /// clears the session if that token is still the current one, so a slow
    /// failure cannot sign out a newer login.
    ///
    /// # Errors
    ///
    /// Returns `result` unchanged.
    pub fn observe<T>(&self, token: &str, result: Result<T, SessionError>) -> Result<T, SessionError> {
        if let Err(SessionError::Unauthorized) = &result {
            let is_current = self.state.borrow().token.as_deref() == Some(token);
            if is_current {
                self.expire();
            } else {
                tracing::debug!("ignoring unauthorized response for a superseded token");
            }
        }
        result
    }

    // =========================================================================
    // COMMITS
    // =========================================================================

    /// Publish `user` unless a sign-out happened after `epoch` was read.
    fn commit_since(&self, epoch: u64, token: String, user: User) -> bool {
        self.state.send_if_modified(|session| {
            if self.signed_out_epoch.load(Ordering::SeqCst) != epoch {
                return false;
            }
            self.persist(&token, &user);
            *session = Session::authenticated(token, user);
            true
        })
    }

    fn persist(&self, token: &str, user: &User) {
        if let Err(e) = self.storage.set(SESSION_TOKEN_KEY, token) {
            tracing::warn!(error = %e, "failed to persist session token");
        }
        if let Err(e) = self.storage.set(ROLE_HINT_KEY, user.role.as_str()) {
            tracing::warn!(error = %e, "failed to persist role hint");
        }
    }

    fn clear(&self) -> Result<(), StorageError> {
        let mut outcome = Ok(());
        self.state.send_modify(|session| {
            self.signed_out_epoch.fetch_add(1, Ordering::SeqCst);
            outcome = self.remove_persisted();
            *session = Session::signed_out();
        });
        outcome
    }

    fn mark_ready(&self) {
        self.state.send_modify(|session| session.phase = LoadingState::Ready);
    }

    /// Persisted token; a blanked entry reads as absent.
    fn persisted_token(&self) -> Option<String> {
        self.storage
            .get(SESSION_TOKEN_KEY)
            .filter(|token| !token.is_empty())
    }

    /// Restore storage to the published token if it still holds `pending`.
    fn rollback_pending(&self, pending: &str) {
        self.state.send_if_modified(|session| {
            if self.persisted_token().as_deref() != Some(pending) {
                return false;
            }
            let restored = match session.token.as_deref() {
                Some(current) => self.storage.set(SESSION_TOKEN_KEY, current),
                None => self.forget(SESSION_TOKEN_KEY),
            };
            if let Err(e) = restored {
                tracing::warn!(error = %e, "failed to roll back pending session token");
            }
            false
        });
    }

    fn remove_persisted(&self) -> Result<(), StorageError> {
        let mut outcome = Ok(());
        for key in [SESSION_TOKEN_KEY, ROLE_HINT_KEY] {
            if let Err(e) = self.forget(key) {
                tracing::error!(key, error = %e, "failed to clear session storage");
                outcome = Err(e);
            }
        }
        outcome
    }

    /// Remove `key`, blanking it if the backend refuses the delete.
    fn forget(&self, key: &str) -> Result<(), StorageError> {
        self.storage.remove(key).or_else(|e| {
            tracing::warn!(key, error = %e, "remove failed; blanking entry");
            self.storage.set(key, "")
        })
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
