//! Shared fixtures for unit tests: user builders and a scripted `AuthApi`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

use crate::error::SessionError;
use crate::net::api::AuthApi;
use crate::net::types::{AccessToken, Credentials, Registration, Role, RoleFlags, SignupDetails, User};
use crate::storage::{DurableStorage, MemoryStorage, SESSION_TOKEN_KEY};

// =============================================================================
// USERS
// =============================================================================

#[must_use]
pub fn user_with_flags(id: i64, is_admin: bool, is_brand: bool) -> User {
    let flags = RoleFlags { is_admin, is_brand };
    User {
        id,
        display_name: format!("user-{id}"),
        email: format!("user{id}@example.com"),
        phone: None,
        created_at: None,
        flags,
        role: Role::from_flags(flags),
    }
}

#[must_use]
pub fn consumer() -> User {
    user_with_flags(1, false, false)
}

#[must_use]
pub fn brand() -> User {
    user_with_flags(2, false, true)
}

#[must_use]
pub fn admin() -> User {
    user_with_flags(3, true, false)
}

// =============================================================================
// MockAuthApi
// =============================================================================

/// Scripted auth backend. Accounts map email -> (password, token); profiles
/// map token -> profile result. Unknown tokens are `Unauthorized`.
#[derive(Default)]
pub struct MockAuthApi {
    accounts: Mutex<HashMap<String, (String, String)>>,
    profiles: Mutex<HashMap<String, Result<User, SessionError>>>,
    authenticate_error: Mutex<Option<SessionError>>,
    register_error: Mutex<Option<SessionError>>,
    observed_storage: Mutex<Option<Arc<dyn DurableStorage>>>,
    fetch_gates: Mutex<HashMap<String, Arc<Notify>>>,
    /// Operation log: `"authenticate:<email>"`, `"fetch:<token>"`, `"register:<email>"`.
    pub calls: Mutex<Vec<String>>,
    /// Value of the persisted token at the moment each profile fetch began.
    pub stored_token_at_fetch: Mutex<Vec<Option<String>>>,
}

impl MockAuthApi {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_account(self, email: &str, password: &str, token: &str, profile: User) -> Self {
        self.accounts
            .lock()
            .unwrap()
            .insert(email.to_owned(), (password.to_owned(), token.to_owned()));
        self.with_profile(token, profile)
    }

    #[must_use]
    pub fn with_profile(self, token: &str, profile: User) -> Self {
        self.profiles
            .lock()
            .unwrap()
            .insert(token.to_owned(), Ok(profile));
        self
    }

    #[must_use]
    pub fn with_profile_error(self, token: &str, error: SessionError) -> Self {
        self.profiles
            .lock()
            .unwrap()
            .insert(token.to_owned(), Err(error));
        self
    }

    #[must_use]
    pub fn with_authenticate_error(self, error: SessionError) -> Self {
        *self.authenticate_error.lock().unwrap() = Some(error);
        self
    }

    #[must_use]
    pub fn with_register_error(self, error: SessionError) -> Self {
        *self.register_error.lock().unwrap() = Some(error);
        self
    }

    /// Hold profile fetches for `token` until `gate` is notified.
    #[must_use]
    pub fn with_fetch_gate(self, token: &str, gate: Arc<Notify>) -> Self {
        self.fetch_gates
            .lock()
            .unwrap()
            .insert(token.to_owned(), gate);
        self
    }

    /// Record the persisted token from `storage` whenever a profile fetch starts.
    pub fn observe_storage(&self, storage: Arc<dyn DurableStorage>) {
        *self.observed_storage.lock().unwrap() = Some(storage);
    }

    #[must_use]
    pub fn calls_matching(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }
}

#[async_trait::async_trait]
impl AuthApi for MockAuthApi {
    async fn authenticate(&self, credentials: &Credentials) -> Result<AccessToken, SessionError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("authenticate:{}", credentials.email));
        tokio::task::yield_now().await;

        if let Some(err) = self.authenticate_error.lock().unwrap().clone() {
            return Err(err);
        }
        let accounts = self.accounts.lock().unwrap();
        match accounts.get(&credentials.email) {
            Some((password, token)) if *password == credentials.password => {
                Ok(AccessToken { access_token: token.clone(), token_type: "bearer".into() })
            }
            _ => Err(SessionError::InvalidCredentials { detail: Some("Invalid credentials".into()) }),
        }
    }

    async fn register(&self, details: &SignupDetails) -> Result<Registration, SessionError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("register:{}", details.email));
        tokio::task::yield_now().await;

        if let Some(err) = self.register_error.lock().unwrap().clone() {
            return Err(err);
        }
        let token = format!("tok-{}", details.email);
        let mut profile = user_with_flags(100, false, false);
        profile.email.clone_from(&details.email);
        profile.display_name.clone_from(&details.name);
        self.accounts
            .lock()
            .unwrap()
            .insert(details.email.clone(), (details.password.clone(), token.clone()));
        self.profiles.lock().unwrap().insert(token, Ok(profile));
        Ok(Registration { user_id: 100, email: details.email.clone(), display_name: details.name.clone() })
    }

    async fn fetch_current_user(&self, token: &str) -> Result<User, SessionError> {
        self.calls.lock().unwrap().push(format!("fetch:{token}"));
        let observed = self.observed_storage.lock().unwrap().clone();
        if let Some(storage) = observed {
            self.stored_token_at_fetch
                .lock()
                .unwrap()
                .push(storage.get(SESSION_TOKEN_KEY));
        }
        let gate = self.fetch_gates.lock().unwrap().get(token).cloned();
        match gate {
            Some(gate) => gate.notified().await,
            None => tokio::task::yield_now().await,
        }

        self.profiles
            .lock()
            .unwrap()
            .get(token)
            .cloned()
            .unwrap_or(Err(SessionError::Unauthorized))
    }
}

#[must_use]
pub fn memory_storage() -> Arc<MemoryStorage> {
    Arc::new(MemoryStorage::new())
}
