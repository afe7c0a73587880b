//! Auth-session state for the current client.
//!
//! SYSTEM CONTEXT
//! ==============
//! [`SessionStore`] is the single writer. Route guards, the ticket service
//! and the CLI only ever read [`Session`] values, either as a snapshot or
//! through a `watch` subscription that fires on every change.

mod store;

pub use store::SessionStore;

use std::fmt;

use crate::net::types::{Registration, Role, User};

/// Whether the startup token check has resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadingState {
    Initializing,
    Ready,
}

/// Current authentication/identity state.
///
/// `user` is present iff `token` is present and was exchanged for a profile.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    token: Option<String>,
    user: Option<User>,
    phase: LoadingState,
}

impl Session {
    /// Startup state: identity unknown.
    #[must_use]
    pub fn initializing() -> Self {
        Self { token: None, user: None, phase: LoadingState::Initializing }
    }

    /// Resolved, nobody logged in.
    #[must_use]
    pub fn signed_out() -> Self {
        Self { token: None, user: None, phase: LoadingState::Ready }
    }

    /// Resolved, `user` logged in with `token`.
    #[must_use]
    pub fn authenticated(token: String, user: User) -> Self {
        Self { token: Some(token), user: Some(user), phase: LoadingState::Ready }
    }

    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    #[must_use]
    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    #[must_use]
    pub fn phase(&self) -> LoadingState {
        self.phase
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.phase == LoadingState::Ready
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.user.as_ref().map(|u| u.role)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("user", &self.user)
            .field("phase", &self.phase)
            .finish()
    }
}

/// What a successful `signup` does to the session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SignupPolicy {
    /// Log in with the same credentials right after registering.
    #[default]
    AutoLogin,
    /// Leave the session alone; the user logs in separately.
    RequireLogin,
}

/// Result of a successful `signup`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SignupOutcome {
    LoggedIn(User),
    Registered(Registration),
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
