//! Authenticated ticket operations.
//!
//! Every call reads the bearer token from the [`SessionStore`] at call time
//! and routes the result back through [`SessionStore::observe`], so a 401
//! from any ticket endpoint signs the client out.

#[cfg(test)]
#[path = "tickets_test.rs"]
mod tests;

use std::sync::Arc;

use crate::error::{FieldError, SessionError};
use crate::net::api::{Page, TicketApi};
use crate::net::types::{DateRange, NewTicket, Ticket, TicketStatus};
use crate::session::SessionStore;

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

pub struct TicketService {
    api: Arc<dyn TicketApi>,
    store: Arc<SessionStore>,
}

impl TicketService {
    #[must_use]
    pub fn new(api: Arc<dyn TicketApi>, store: Arc<SessionStore>) -> Self {
        Self { api, store }
    }

    /// Current token, or `Unauthorized` without touching the network.
    fn require_token(&self) -> Result<String, SessionError> {
        self.store.token().ok_or_else(|| {
            tracing::debug!("ticket call without a session");
            SessionError::Unauthorized
        })
    }

    /// # Errors
    ///
    /// `Unauthorized` without a session, otherwise the backend's error.
    pub async fn create_ticket(&self, ticket: &NewTicket) -> Result<Ticket, SessionError> {
        let token = self.require_token()?;
        let result = self.api.create_ticket(&token, ticket).await;
        if let Ok(created) = &result {
            tracing::info!(ticket_id = created.id, brand_id = created.brand_id, "ticket created");
        }
        self.store.observe(&token, result)
    }

    /// # Errors
    ///
    /// `NotFound` for an unknown id, `Unauthorized` without a valid session.
    pub async fn get_ticket(&self, ticket_id: i64) -> Result<Ticket, SessionError> {
        let token = self.require_token()?;
        let result = self.api.get_ticket(&token, ticket_id).await;
        self.store.observe(&token, result)
    }

    /// # Errors
    ///
    /// `Unauthorized` without a valid session, otherwise the backend's error.
    pub async fn list_tickets(&self, page: Page) -> Result<Vec<Ticket>, SessionError> {
        let token = self.require_token()?;
        let result = self.api.list_tickets(&token, page).await;
        self.store.observe(&token, result)
    }

    /// Public complaint feed. Works signed out; the token is attached when present.
    ///
    /// # Errors
    ///
    /// Returns the backend's error.
    pub async fn public_complaints(&self, page: Page) -> Result<Vec<Ticket>, SessionError> {
        match self.store.token() {
            Some(token) => {
                let result = self.api.public_complaints(Some(&token), page).await;
                self.store.observe(&token, result)
            }
            None => self.api.public_complaints(None, page).await,
        }
    }

    /// # Errors
    ///
    /// `Unauthorized` without a valid session, otherwise the backend's error.
    pub async fn update_status(&self, ticket_id: i64, status: TicketStatus) -> Result<Ticket, SessionError> {
        let token = self.require_token()?;
        let result = self.api.update_status(&token, ticket_id, status).await;
        if result.is_ok() {
            tracing::info!(ticket_id, status = status.as_str(), "ticket status updated");
        }
        self.store.observe(&token, result)
    }

    /// # Errors
    ///
    /// `Validation` for a blank message, `Unauthorized` without a valid
    /// session, otherwise the backend's error.
    pub async fn add_response(&self, ticket_id: i64, message: &str) -> Result<serde_json::Value, SessionError> {
        if message.trim().is_empty() {
            return Err(field_error("message", "Response message cannot be empty"));
        }
        let token = self.require_token()?;
        let result = self.api.add_response(&token, ticket_id, message).await;
        self.store.observe(&token, result)
    }

    /// Rate a resolved ticket from [`MIN_RATING`] to [`MAX_RATING`].
    ///
    /// # Errors
    ///
    /// `Validation` for an out-of-range rating (checked before any request),
    /// `Unauthorized` without a valid session, otherwise the backend's error.
    pub async fn rate_ticket(
        &self,
        ticket_id: i64,
        rating: u8,
        comment: Option<&str>,
    ) -> Result<serde_json::Value, SessionError> {
        if !(MIN_RATING..=MAX_RATING).contains(&rating) {
            return Err(field_error("rating", "Rating must be between 1 and 5"));
        }
        let token = self.require_token()?;
        let result = self.api.rate_ticket(&token, ticket_id, rating, comment).await;
        self.store.observe(&token, result)
    }

    /// Ticket analytics for one brand over an optional date range.
    ///
    /// # Errors
    ///
    /// `Unauthorized` without a valid session, otherwise the backend's error.
    pub async fn ticket_analytics(&self, brand_id: i64, range: &DateRange) -> Result<serde_json::Value, SessionError> {
        let token = self.require_token()?;
        let result = self.api.ticket_analytics(&token, brand_id, range).await;
        self.store.observe(&token, result)
    }
}

pub(crate) fn field_error(field: &str, message: &str) -> SessionError {
    SessionError::Validation {
        detail: None,
        fields: vec![FieldError { field: field.to_owned(), message: message.to_owned() }],
    }
}
