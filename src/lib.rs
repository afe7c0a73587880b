//! ComplaintHub client core.
//!
//! SYSTEM CONTEXT
//! ==============
//! A client-side session store backed by durable key/value storage, a
//! role-based route guard, and the authenticated ticket calls that ride on
//! the session. The backend is reached over its REST API through
//! [`net::api::HttpApi`].
//!
//! ```text
//!   storage ──> SessionStore ──watch──> RouteGuard / routes::navigate
//!                   │   ▲
//!                   ▼   │ observe(401 → expire)
//!                AuthApi  TicketService ──> TicketApi
//!                         BrandService  ──> BrandApi
//! ```

pub mod brands;
pub mod config;
pub mod error;
pub mod guard;
pub mod net;
pub mod routes;
pub mod session;
pub mod storage;
pub mod tickets;

#[cfg(test)]
mod test_helpers;

pub use error::SessionError;
pub use session::{Session, SessionStore};
