use std::sync::Arc;

use super::*;
use crate::net::types::{Credentials, User};
use crate::session::{SessionStore, SignupPolicy};
use crate::storage::{DurableStorage, SESSION_TOKEN_KEY};
use crate::test_helpers::{MockAuthApi, admin, brand, consumer, memory_storage, user_with_flags};

fn ready(user: User) -> Session {
    Session::authenticated("tok".into(), user)
}

fn guard(role: &str) -> RouteGuard {
    RouteGuard::new(role, RedirectPolicy::RoleHome)
}

// =============================================================
// RequiredRole
// =============================================================

#[test]
fn required_role_parses_known_names() {
    assert_eq!(RequiredRole::parse("admin"), RequiredRole::Admin);
    assert_eq!(RequiredRole::parse("brand"), RequiredRole::Brand);
    assert_eq!(RequiredRole::parse("user"), RequiredRole::User);
    assert_eq!(RequiredRole::parse("Admin"), RequiredRole::Other("Admin".into()));
    assert_eq!(RequiredRole::from("moderator").to_string(), "moderator");
}

#[test]
fn unknown_role_never_admits() {
    let role = RequiredRole::parse("superuser");
    for (is_admin, is_brand) in [(false, false), (true, false), (false, true), (true, true)] {
        assert!(!role.admits(RoleFlags { is_admin, is_brand }));
    }
}

// =============================================================
// can_access: loading and anonymous
// =============================================================

#[test]
fn initializing_session_is_pending_not_redirect() {
    for role in ["admin", "brand", "user", "other"] {
        assert_eq!(guard(role).evaluate(&Session::initializing()), Access::Pending);
    }
}

#[test]
fn anonymous_is_sent_to_public_landing() {
    assert_eq!(
        guard("user").evaluate(&Session::signed_out()),
        Access::Redirect(Destination::PublicLanding)
    );
    assert_eq!(
        RouteGuard::new("admin", RedirectPolicy::PublicLanding).evaluate(&Session::signed_out()),
        Access::Redirect(Destination::PublicLanding)
    );
}

// =============================================================
// can_access: per-role matrix
// =============================================================

#[test]
fn consumer_allowed_only_under_user() {
    let session = ready(consumer());
    assert_eq!(guard("user").evaluate(&session), Access::Allow);
    assert_eq!(guard("admin").evaluate(&session), Access::Redirect(Destination::ConsumerHome));
    assert_eq!(guard("brand").evaluate(&session), Access::Redirect(Destination::ConsumerHome));
}

#[test]
fn admin_allowed_only_under_admin() {
    let session = ready(admin());
    assert_eq!(guard("admin").evaluate(&session), Access::Allow);
    assert_eq!(guard("brand").evaluate(&session), Access::Redirect(Destination::AdminHome));
    assert_eq!(guard("user").evaluate(&session), Access::Redirect(Destination::AdminHome));
}

#[test]
fn brand_allowed_only_under_brand() {
    let session = ready(brand());
    assert_eq!(guard("brand").evaluate(&session), Access::Allow);
    assert_eq!(guard("admin").evaluate(&session), Access::Redirect(Destination::BrandHome));
    assert_eq!(guard("user").evaluate(&session), Access::Redirect(Destination::BrandHome));
}

#[test]
fn dual_flag_user_enters_admin_and_brand_but_is_homed_as_brand() {
    let session = ready(user_with_flags(9, true, true));
    assert_eq!(guard("admin").evaluate(&session), Access::Allow);
    assert_eq!(guard("brand").evaluate(&session), Access::Allow);
    assert_eq!(guard("user").evaluate(&session), Access::Redirect(Destination::BrandHome));
}

#[test]
fn unknown_required_role_redirects_authenticated_users_home() {
    assert_eq!(guard("root").evaluate(&ready(admin())), Access::Redirect(Destination::AdminHome));
}

#[test]
fn public_landing_policy_ignores_actual_role() {
    let g = RouteGuard::new("admin", RedirectPolicy::PublicLanding);
    assert_eq!(g.evaluate(&ready(brand())), Access::Redirect(Destination::PublicLanding));
    assert_eq!(g.evaluate(&ready(admin())), Access::Allow);
}

#[test]
fn decision_depends_only_on_role_and_flags() {
    let roles = ["admin", "brand", "user", "x"];
    for (is_admin, is_brand) in [(false, false), (true, false), (false, true), (true, true)] {
        let a = ready(user_with_flags(1, is_admin, is_brand));
        let mut other = user_with_flags(2, is_admin, is_brand);
        other.display_name = "someone else".into();
        let b = Session::authenticated("different-token".into(), other);
        for role in roles {
            let g = guard(role);
            assert_eq!(g.evaluate(&a), g.evaluate(&b), "role {role}, flags ({is_admin}, {is_brand})");
            assert_eq!(g.evaluate(&a), g.evaluate(&a));
        }
    }
}

// =============================================================
// Destinations
// =============================================================

#[test]
fn destination_paths() {
    assert_eq!(Destination::PublicLanding.path(), "/");
    assert_eq!(Destination::home_for(Role::Consumer).path(), "/user/dashboard");
    assert_eq!(Destination::home_for(Role::Brand).path(), "/brand/dashboard");
    assert_eq!(Destination::home_for(Role::Admin).path(), "/admin/dashboard");
}

// =============================================================
// GuardState
// =============================================================

#[test]
fn guard_state_machine() {
    let g = guard("brand");
    assert_eq!(g.state(&Session::initializing()), GuardState::Initializing);
    assert_eq!(g.state(&Session::signed_out()), GuardState::Unauthenticated);
    assert_eq!(g.state(&ready(consumer())), GuardState::AuthorizedWrongRole);
    assert_eq!(g.state(&ready(brand())), GuardState::AuthorizedCorrectRole);
}

// =============================================================
// Wired to a SessionStore
// =============================================================

fn store(api: MockAuthApi, storage: Arc<dyn DurableStorage>) -> SessionStore {
    SessionStore::new(Arc::new(api), storage, SignupPolicy::AutoLogin)
}

#[tokio::test]
async fn fresh_start_redirects_user_route_to_landing() {
    let store = store(MockAuthApi::new(), memory_storage());
    let mut rx = store.subscribe();
    let g = guard("user");

    assert_eq!(g.evaluate(&store.snapshot()), Access::Pending);
    store.initialize().await;

    assert_eq!(g.settled(&mut rx).await, Some(Access::Redirect(Destination::PublicLanding)));
}

#[tokio::test]
async fn restored_brand_session_allows_brand_and_homes_admin_route() {
    let storage = memory_storage();
    storage.set(SESSION_TOKEN_KEY, "tok-brand").unwrap();
    let store = store(MockAuthApi::new().with_profile("tok-brand", brand()), storage);

    let session = store.initialize().await;

    assert_eq!(guard("brand").evaluate(&session), Access::Allow);
    assert_eq!(guard("admin").evaluate(&session), Access::Redirect(Destination::BrandHome));
}

#[tokio::test]
async fn guard_reevaluates_on_every_session_change() {
    let store = store(
        MockAuthApi::new().with_account("a@b.com", "pw", "tok-a", consumer()),
        memory_storage(),
    );
    let mut rx = store.subscribe();
    let g = guard("user");

    store.initialize().await;
    assert_eq!(g.next_decision(&mut rx).await, Some(Access::Redirect(Destination::PublicLanding)));

    store.login(&Credentials::new("a@b.com", "pw")).await.unwrap();
    assert_eq!(g.next_decision(&mut rx).await, Some(Access::Allow));

    store.expire();
    assert_eq!(g.next_decision(&mut rx).await, Some(Access::Redirect(Destination::PublicLanding)));
}

#[tokio::test]
async fn next_decision_ends_when_store_is_dropped() {
    let store = store(MockAuthApi::new(), memory_storage());
    let mut rx = store.subscribe();
    drop(store);

    assert_eq!(guard("user").next_decision(&mut rx).await, None);
}
