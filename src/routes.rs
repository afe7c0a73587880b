//! Client route table and navigation decisions.
//!
//! Paths are matched segment by segment; a `:param` segment matches any
//! single non-empty segment. Query strings, fragments and trailing slashes
//! are ignored.

#[cfg(test)]
#[path = "routes_test.rs"]
mod tests;

use crate::guard::{Access, Destination, RedirectPolicy, RequiredRole, can_access};
use crate::session::Session;

/// Access class of a client path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RouteAccess {
    Public,
    Protected(RequiredRole),
    /// Unknown path; the client navigates to the landing page.
    Fallback,
}

#[derive(Clone, Copy)]
enum Gate {
    Public,
    User,
    Brand,
    Admin,
}

const ROUTES: &[(&str, Gate)] = &[
    ("/", Gate::Public),
    ("/complaints", Gate::Public),
    ("/user/login", Gate::Public),
    ("/user/signup", Gate::Public),
    ("/brand/login", Gate::Public),
    ("/brand/signup", Gate::Public),
    ("/user/dashboard", Gate::User),
    ("/user/complaint/new", Gate::User),
    ("/user/ticket/:id", Gate::User),
    ("/user/settings", Gate::User),
    ("/brand/dashboard", Gate::Brand),
    ("/brand/tickets", Gate::Brand),
    ("/brand/tickets/:id", Gate::Brand),
    ("/brand/analytics", Gate::Brand),
    ("/brand/billing", Gate::Brand),
    ("/brand/settings", Gate::Brand),
    ("/admin/dashboard", Gate::Admin),
    ("/admin/brands", Gate::Admin),
    ("/admin/users", Gate::Admin),
    ("/admin/settings", Gate::Admin),
    ("/admin/reports", Gate::Admin),
];

fn segments(path: &str) -> impl Iterator<Item = &str> {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    path.split('/').filter(|s| !s.is_empty())
}

fn matches(pattern: &str, path: &str) -> bool {
    let mut want = segments(pattern);
    let mut got = segments(path);
    loop {
        match (want.next(), got.next()) {
            (None, None) => return true,
            (Some(w), Some(g)) if w.starts_with(':') || w == g => {}
            _ => return false,
        }
    }
}

/// Look up the access class of `path`.
#[must_use]
pub fn route_for(path: &str) -> RouteAccess {
    let Some((_, gate)) = ROUTES.iter().find(|(pattern, _)| matches(pattern, path)) else {
        return RouteAccess::Fallback;
    };
    match gate {
        Gate::Public => RouteAccess::Public,
        Gate::User => RouteAccess::Protected(RequiredRole::User),
        Gate::Brand => RouteAccess::Protected(RequiredRole::Brand),
        Gate::Admin => RouteAccess::Protected(RequiredRole::Admin),
    }
}

/// What the client should do when asked to show a path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Navigation {
    Render,
    /// Session still initializing; show a placeholder.
    Loading,
    Redirect(&'static str),
}

/// Combine the route table with the guard for the current session.
#[must_use]
pub fn navigate(path: &str, session: &Session, policy: RedirectPolicy) -> Navigation {
    match route_for(path) {
        RouteAccess::Public => Navigation::Render,
        RouteAccess::Fallback => Navigation::Redirect(Destination::PublicLanding.path()),
        RouteAccess::Protected(required) => match can_access(&required, session, policy) {
            Access::Pending => Navigation::Loading,
            Access::Allow => Navigation::Render,
            Access::Redirect(to) => Navigation::Redirect(to.path()),
        },
    }
}
