//! Role-gated access decisions for protected sections.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every protected section applies the same rule: wait while the session is
//! initializing, send anonymous visitors to the public landing page, and
//! send authenticated users with the wrong role to a policy-chosen target.
//! Decisions are re-evaluated from the session `watch` channel, never polled.

#[cfg(test)]
#[path = "guard_test.rs"]
mod guard_test;

use std::fmt;

use tokio::sync::watch;

use crate::net::types::{Role, RoleFlags};
use crate::session::Session;

// =============================================================================
// ROLES AND DESTINATIONS
// =============================================================================

/// Role a protected section requires. Unrecognised names never grant access.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum RequiredRole {
    Admin,
    Brand,
    User,
    Other(String),
}

impl RequiredRole {
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            "admin" => Self::Admin,
            "brand" => Self::Brand,
            "user" => Self::User,
            other => Self::Other(other.to_owned()),
        }
    }

    /// Whether a user with `flags` may enter.
    #[must_use]
    pub fn admits(&self, flags: RoleFlags) -> bool {
        match self {
            Self::Admin => flags.is_admin,
            Self::Brand => flags.is_brand,
            Self::User => !flags.is_admin && !flags.is_brand,
            Self::Other(_) => false,
        }
    }
}

impl From<&str> for RequiredRole {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl fmt::Display for RequiredRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admin => f.write_str("admin"),
            Self::Brand => f.write_str("brand"),
            Self::User => f.write_str("user"),
            Self::Other(raw) => f.write_str(raw),
        }
    }
}

/// Where a redirect sends the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Destination {
    PublicLanding,
    ConsumerHome,
    BrandHome,
    AdminHome,
}

impl Destination {
    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::PublicLanding => "/",
            Self::ConsumerHome => "/user/dashboard",
            Self::BrandHome => "/brand/dashboard",
            Self::AdminHome => "/admin/dashboard",
        }
    }

    /// Dashboard a user of `role` lands on.
    #[must_use]
    pub fn home_for(role: Role) -> Self {
        match role {
            Role::Consumer => Self::ConsumerHome,
            Role::Brand => Self::BrandHome,
            Role::Admin => Self::AdminHome,
        }
    }
}

/// Where authenticated users with the wrong role are sent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RedirectPolicy {
    /// To their own dashboard.
    #[default]
    RoleHome,
    /// Always to the public landing page.
    PublicLanding,
}

// =============================================================================
// DECISIONS
// =============================================================================

/// Outcome of a guard check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    /// Identity not known yet; show a loading placeholder.
    Pending,
    Allow,
    Redirect(Destination),
}

/// Per-route guard state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuardState {
    Initializing,
    Unauthenticated,
    AuthorizedWrongRole,
    AuthorizedCorrectRole,
}

/// Decide access to a section requiring `required` for `session`.
#[must_use]
pub fn can_access(required: &RequiredRole, session: &Session, policy: RedirectPolicy) -> Access {
    if !session.is_ready() {
        return Access::Pending;
    }
    let Some(user) = session.user() else {
        return Access::Redirect(Destination::PublicLanding);
    };
    if required.admits(user.flags) {
        return Access::Allow;
    }
    match policy {
        RedirectPolicy::RoleHome => Access::Redirect(Destination::home_for(user.role)),
        RedirectPolicy::PublicLanding => Access::Redirect(Destination::PublicLanding),
    }
}

/// Guard for one protected section.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteGuard {
    required: RequiredRole,
    policy: RedirectPolicy,
}

impl RouteGuard {
    #[must_use]
    pub fn new(required: impl Into<RequiredRole>, policy: RedirectPolicy) -> Self {
        Self { required: required.into(), policy }
    }

    #[must_use]
    pub fn required(&self) -> &RequiredRole {
        &self.required
    }

    #[must_use]
    pub fn policy(&self) -> RedirectPolicy {
        self.policy
    }

    #[must_use]
    pub fn evaluate(&self, session: &Session) -> Access {
        can_access(&self.required, session, self.policy)
    }

    #[must_use]
    pub fn state(&self, session: &Session) -> GuardState {
        match (session.is_ready(), session.user()) {
            (false, _) => GuardState::Initializing,
            (true, None) => GuardState::Unauthenticated,
            (true, Some(user)) if self.required.admits(user.flags) => GuardState::AuthorizedCorrectRole,
            (true, Some(_)) => GuardState::AuthorizedWrongRole,
        }
    }

    /// Wait for the next session change and decide again.
    ///
    /// Returns `None` once the session store has been dropped.
    pub async fn next_decision(&self, rx: &mut watch::Receiver<Session>) -> Option<Access> {
        rx.changed().await.ok()?;
        let session = rx.borrow_and_update();
        Some(self.evaluate(&session))
    }

    /// Wait until the session has left `Initializing` and decide.
    ///
    /// Returns `None` if the store is dropped before that happens.
    pub async fn settled(&self, rx: &mut watch::Receiver<Session>) -> Option<Access> {
        let session = rx.wait_for(Session::is_ready).await.ok()?;
        Some(self.evaluate(&session))
    }
}
