//! Brand console operations: dashboard, ticket queue, assignment, credits
//! and analytics.
//!
//! Same contract as [`crate::tickets::TicketService`]: the token is read
//! from the store per call, a missing session fails before any request,
//! and results pass through [`SessionStore::observe`].

#[cfg(test)]
#[path = "brands_test.rs"]
mod tests;

use std::sync::Arc;

use crate::error::SessionError;
use crate::net::api::{BrandApi, BrandTicketFilter, Page};
use crate::net::types::{BrandAnalytics, BrandDashboard, CreditBalance, CreditTopUp, CreditTransaction, DateRange, Ticket};
use crate::session::SessionStore;
use crate::tickets::field_error;

pub struct BrandService {
    api: Arc<dyn BrandApi>,
    store: Arc<SessionStore>,
}

impl BrandService {
    #[must_use]
    pub fn new(api: Arc<dyn BrandApi>, store: Arc<SessionStore>) -> Self {
        Self { api, store }
    }

    fn require_token(&self) -> Result<String, SessionError> {
        self.store.token().ok_or_else(|| {
            tracing::debug!("brand call without a session");
            SessionError::Unauthorized
        })
    }

    /// # Errors
    ///
    /// `Unauthorized` without a valid session, `NotFound` for an unknown brand.
    pub async fn dashboard(&self, brand_id: i64) -> Result<BrandDashboard, SessionError> {
        let token = self.require_token()?;
        let result = self.api.dashboard(&token, brand_id).await;
        self.store.observe(&token, result)
    }

    /// The brand's ticket queue, optionally narrowed to one status.
    ///
    /// # Errors
    ///
    /// `Unauthorized` without a valid session, otherwise the backend's error.
    pub async fn tickets(&self, brand_id: i64, filter: BrandTicketFilter) -> Result<Vec<Ticket>, SessionError> {
        let token = self.require_token()?;
        let result = self.api.brand_tickets(&token, brand_id, &filter).await;
        self.store.observe(&token, result)
    }

    /// # Errors
    ///
    /// `Unauthorized` without a valid session, otherwise the backend's error.
    pub async fn assign_ticket(&self, ticket_id: i64, assignee_id: i64) -> Result<Ticket, SessionError> {
        let token = self.require_token()?;
        let result = self.api.assign_ticket(&token, ticket_id, assignee_id).await;
        if result.is_ok() {
            tracing::info!(ticket_id, assignee_id, "ticket assigned");
        }
        self.store.observe(&token, result)
    }

    /// # Errors
    ///
    /// `Unauthorized` without a valid session, `NotFound` for an unknown brand.
    pub async fn credits(&self, brand_id: i64) -> Result<CreditBalance, SessionError> {
        let token = self.require_token()?;
        let result = self.api.credits(&token, brand_id).await;
        self.store.observe(&token, result)
    }

    /// Top up the brand's credit balance.
    ///
    /// # Errors
    ///
    /// `Validation` unless `amount` is a positive finite number (checked
    /// before any request), `Unauthorized` without a valid session,
    /// otherwise the backend's error.
    pub async fn add_credits(&self, brand_id: i64, amount: f64) -> Result<CreditTopUp, SessionError> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(field_error("amount", "Amount must be greater than zero"));
        }
        let token = self.require_token()?;
        let result = self.api.add_credits(&token, brand_id, amount).await;
        if let Ok(top_up) = &result {
            tracing::info!(brand_id, amount, new_balance = top_up.new_balance, "credits added");
        }
        self.store.observe(&token, result)
    }

    /// # Errors
    ///
    /// `Unauthorized` without a valid session, otherwise the backend's error.
    pub async fn transactions(&self, brand_id: i64, page: Page) -> Result<Vec<CreditTransaction>, SessionError> {
        let token = self.require_token()?;
        let result = self.api.transactions(&token, brand_id, page).await;
        self.store.observe(&token, result)
    }

    /// # Errors
    ///
    /// `Unauthorized` without a valid session, otherwise the backend's error.
    pub async fn analytics(&self, brand_id: i64, range: &DateRange) -> Result<BrandAnalytics, SessionError> {
        let token = self.require_token()?;
        let result = self.api.analytics(&token, brand_id, range).await;
        self.store.observe(&token, result)
    }
}
