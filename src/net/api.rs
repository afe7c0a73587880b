//! REST client for the ComplaintHub backend.
//!
//! SYSTEM CONTEXT
//! ==============
//! `AuthApi` is the seam the session store talks through. `TicketApi` and
//! `BrandApi` are the seams for the ticket and brand services. `HttpApi`
//! implements all three over `reqwest`, and tests substitute hand-written
//! mocks.
//!
//! ERROR HANDLING
//! ==============
//! Every non-2xx response is classified from its status and FastAPI-style
//! `{"detail": ...}` body. A 401 means bad credentials on the login
//! endpoint and an invalid/expired token everywhere else.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use std::time::Duration;

use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::types::{
    AccessToken, BrandAnalytics, BrandDashboard, CreditBalance, CreditTopUp, CreditTransaction, Credentials,
    DateRange, NewTicket, Registration, SignupDetails, Ticket, TicketStatus, User, UserRecord,
};
use crate::config::{ClientConfig, ConfigError, HttpTimeouts};
use crate::error::{FieldError, SessionError};

// =============================================================================
// TRAITS
// =============================================================================

/// Authentication collaborators consumed by the session store.
#[async_trait::async_trait]
pub trait AuthApi: Send + Sync {
    /// Exchange email/password for a bearer token.
    async fn authenticate(&self, credentials: &Credentials) -> Result<AccessToken, SessionError>;

    /// Create a new account.
    async fn register(&self, details: &SignupDetails) -> Result<Registration, SessionError>;

    /// Resolve the profile behind `token`.
    async fn fetch_current_user(&self, token: &str) -> Result<User, SessionError>;
}

/// Ticket endpoints. `token` is attached as a bearer header when present.
#[async_trait::async_trait]
pub trait TicketApi: Send + Sync {
    async fn create_ticket(&self, token: &str, ticket: &NewTicket) -> Result<Ticket, SessionError>;
    async fn get_ticket(&self, token: &str, ticket_id: i64) -> Result<Ticket, SessionError>;
    async fn list_tickets(&self, token: &str, page: Page) -> Result<Vec<Ticket>, SessionError>;
    async fn public_complaints(&self, token: Option<&str>, page: Page) -> Result<Vec<Ticket>, SessionError>;
    async fn update_status(&self, token: &str, ticket_id: i64, status: TicketStatus) -> Result<Ticket, SessionError>;
    async fn add_response(
        &self,
        token: &str,
        ticket_id: i64,
        message: &str,
    ) -> Result<serde_json::Value, SessionError>;
    async fn rate_ticket(
        &self,
        token: &str,
        ticket_id: i64,
        rating: u8,
        comment: Option<&str>,
    ) -> Result<serde_json::Value, SessionError>;
    /// Brand-wide ticket analytics. The payload shape is owned by the backend.
    async fn ticket_analytics(
        &self,
        token: &str,
        brand_id: i64,
        range: &DateRange,
    ) -> Result<serde_json::Value, SessionError>;
}

/// Brand console endpoints. Every call needs a bearer token.
#[async_trait::async_trait]
pub trait BrandApi: Send + Sync {
    async fn dashboard(&self, token: &str, brand_id: i64) -> Result<BrandDashboard, SessionError>;
    async fn brand_tickets(
        &self,
        token: &str,
        brand_id: i64,
        filter: &BrandTicketFilter,
    ) -> Result<Vec<Ticket>, SessionError>;
    async fn assign_ticket(&self, token: &str, ticket_id: i64, assignee_id: i64) -> Result<Ticket, SessionError>;
    async fn credits(&self, token: &str, brand_id: i64) -> Result<CreditBalance, SessionError>;
    async fn add_credits(&self, token: &str, brand_id: i64, amount: f64) -> Result<CreditTopUp, SessionError>;
    async fn transactions(&self, token: &str, brand_id: i64, page: Page) -> Result<Vec<CreditTransaction>, SessionError>;
    async fn analytics(&self, token: &str, brand_id: i64, range: &DateRange) -> Result<BrandAnalytics, SessionError>;
}

// =============================================================================
// PAGINATION
// =============================================================================

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// `skip`/`limit` window for list endpoints. `limit` is clamped to 1..=100.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub skip: u32,
    pub limit: u32,
}

impl Page {
    #[must_use]
    pub fn new(skip: u32, limit: u32) -> Self {
        Self { skip, limit: limit.clamp(1, MAX_PAGE_SIZE) }
    }

    fn query(self) -> String {
        format!("skip={}&limit={}", self.skip, self.limit)
    }

    fn pairs(self) -> Vec<(&'static str, String)> {
        vec![("skip", self.skip.to_string()), ("limit", self.limit.to_string())]
    }
}

impl Default for Page {
    fn default() -> Self {
        Self { skip: 0, limit: DEFAULT_PAGE_SIZE }
    }
}

/// Brand ticket queue filter. `status: None` lists every status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BrandTicketFilter {
    pub status: Option<TicketStatus>,
    pub page: Page,
}

impl BrandTicketFilter {
    fn pairs(self) -> Vec<(&'static str, String)> {
        let mut pairs = self.page.pairs();
        if let Some(status) = self.status {
            pairs.push(("status", status.as_str().to_owned()));
        }
        pairs
    }
}

// =============================================================================
// ERROR CLASSIFICATION
// =============================================================================

/// How a 401 from an endpoint should be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AuthScope {
    /// Login: 401 means the email/password pair was rejected.
    Credentials,
    /// Everything else: 401 means the bearer token is invalid or expired.
    Session,
}

#[derive(serde::Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
}

/// Split a FastAPI `detail` into a display string and per-field messages.
pub(crate) fn parse_detail(body: &str) -> (Option<String>, Vec<FieldError>) {
    let Ok(ErrorBody { detail: Some(detail) }) = serde_json::from_str::<ErrorBody>(body) else {
        return (None, Vec::new());
    };
    match detail {
        serde_json::Value::String(s) if !s.trim().is_empty() => (Some(s), Vec::new()),
        serde_json::Value::Array(items) => {
            let fields = items.iter().filter_map(field_error_from_value).collect();
            (None, fields)
        }
        _ => (None, Vec::new()),
    }
}

fn field_error_from_value(item: &serde_json::Value) -> Option<FieldError> {
    let message = item.get("msg")?.as_str()?.to_owned();
    let path: Vec<String> = item
        .get("loc")
        .and_then(serde_json::Value::as_array)
        .map(|loc| {
            loc.iter()
                .filter_map(|seg| match seg {
                    serde_json::Value::String(s) if s != "body" => Some(s.clone()),
                    serde_json::Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();
    let field = if path.is_empty() { "request".to_owned() } else { path.join(".") };
    Some(FieldError { field, message })
}

/// Map a failed response to the error taxonomy.
pub(crate) fn classify_failure(scope: AuthScope, status: u16, body: &str) -> SessionError {
    let (detail, fields) = parse_detail(body);
    match (status, scope) {
        (401, AuthScope::Credentials) => SessionError::InvalidCredentials { detail },
        (401, AuthScope::Session) => SessionError::Unauthorized,
        (400 | 422, _) => SessionError::Validation { detail, fields },
        (404, _) => SessionError::NotFound { detail },
        _ => SessionError::Unknown { status: Some(status), detail },
    }
}

// =============================================================================
// HTTP CLIENT
// =============================================================================

/// `reqwest`-backed implementation of [`AuthApi`] and [`TicketApi`].
#[derive(Debug, Clone)]
pub struct HttpApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpApi {
    /// Build a client rooted at `base_url` (e.g. `http://host/api/v1`).
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is blank or the HTTP client fails to build.
    pub fn new(base_url: &str, timeouts: HttpTimeouts) -> Result<Self, ConfigError> {
        let base_url = crate::config::normalize_base_url(base_url)?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(|e| ConfigError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url })
    }

    /// Build a client from a parsed [`ClientConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ConfigError> {
        Self::new(&config.api_base_url, config.timeouts)
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T, B>(
        &self,
        method: Method,
        path: &str,
        query: &[(&'static str, String)],
        token: Option<&str>,
        body: Option<&B>,
        scope: AuthScope,
    ) -> Result<T, SessionError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized + Sync,
    {
        let mut request = self.http.request(method.clone(), self.url(path));
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            tracing::debug!(%method, path, error = %e, "api request failed");
            SessionError::Network(e.to_string())
        })?;
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| SessionError::Network(e.to_string()))?;
        tracing::debug!(%method, path, status, "api response");

        if !(200..300).contains(&status) {
            return Err(classify_failure(scope, status, &text));
        }
        serde_json::from_str(&text).map_err(|e| SessionError::Unknown {
            status: Some(status),
            detail: Some(format!("unexpected response body: {e}")),
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, token: Option<&str>) -> Result<T, SessionError> {
        self.get_query(path, &[], token).await
    }

    async fn get_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&'static str, String)],
        token: Option<&str>,
    ) -> Result<T, SessionError> {
        self.send::<T, ()>(Method::GET, path, query, token, None, AuthScope::Session)
            .await
    }
}

pub(crate) fn brand_path(brand_id: i64) -> String {
    format!("/brands/{brand_id}")
}

pub(crate) fn ticket_path(ticket_id: i64) -> String {
    format!("/tickets/{ticket_id}")
}

#[async_trait::async_trait]
impl AuthApi for HttpApi {
    async fn authenticate(&self, credentials: &Credentials) -> Result<AccessToken, SessionError> {
        self.send(Method::POST, "/auth/login", &[], None, Some(credentials), AuthScope::Credentials)
            .await
    }

    async fn register(&self, details: &SignupDetails) -> Result<Registration, SessionError> {
        let record: UserRecord = self
            .send(Method::POST, "/auth/signup", &[], None, Some(details), AuthScope::Session)
            .await?;
        Ok(record.into())
    }

    async fn fetch_current_user(&self, token: &str) -> Result<User, SessionError> {
        let record: UserRecord = self.get("/auth/me", Some(token)).await?;
        Ok(record.into())
    }
}

#[async_trait::async_trait]
impl TicketApi for HttpApi {
    async fn create_ticket(&self, token: &str, ticket: &NewTicket) -> Result<Ticket, SessionError> {
        self.send(Method::POST, "/tickets/", &[], Some(token), Some(ticket), AuthScope::Session)
            .await
    }

    async fn get_ticket(&self, token: &str, ticket_id: i64) -> Result<Ticket, SessionError> {
        self.get(&ticket_path(ticket_id), Some(token)).await
    }

    async fn list_tickets(&self, token: &str, page: Page) -> Result<Vec<Ticket>, SessionError> {
        self.get(&format!("/tickets/?{}", page.query()), Some(token))
            .await
    }

    async fn public_complaints(&self, token: Option<&str>, page: Page) -> Result<Vec<Ticket>, SessionError> {
        self.get(&format!("/tickets/public?{}", page.query()), token)
            .await
    }

    async fn update_status(&self, token: &str, ticket_id: i64, status: TicketStatus) -> Result<Ticket, SessionError> {
        let body = serde_json::json!({ "status": status });
        let path = format!("{}/status", ticket_path(ticket_id));
        self.send(Method::PATCH, &path, &[], Some(token), Some(&body), AuthScope::Session)
            .await
    }

    async fn add_response(
        &self,
        token: &str,
        ticket_id: i64,
        message: &str,
    ) -> Result<serde_json::Value, SessionError> {
        let body = serde_json::json!({ "message": message });
        let path = format!("{}/responses", ticket_path(ticket_id));
        self.send(Method::POST, &path, &[], Some(token), Some(&body), AuthScope::Session)
            .await
    }

    async fn rate_ticket(
        &self,
        token: &str,
        ticket_id: i64,
        rating: u8,
        comment: Option<&str>,
    ) -> Result<serde_json::Value, SessionError> {
        let body = serde_json::json!({ "rating": rating, "comment": comment });
        let path = format!("{}/rate", ticket_path(ticket_id));
        self.send(Method::POST, &path, &[], Some(token), Some(&body), AuthScope::Session)
            .await
    }

    async fn ticket_analytics(
        &self,
        token: &str,
        brand_id: i64,
        range: &DateRange,
    ) -> Result<serde_json::Value, SessionError> {
        self.get_query(&format!("/analytics/tickets/{brand_id}"), &range.pairs(), Some(token))
            .await
    }
}

#[async_trait::async_trait]
impl BrandApi for HttpApi {
    async fn dashboard(&self, token: &str, brand_id: i64) -> Result<BrandDashboard, SessionError> {
        self.get(&format!("{}/dashboard", brand_path(brand_id)), Some(token))
            .await
    }

    async fn brand_tickets(
        &self,
        token: &str,
        brand_id: i64,
        filter: &BrandTicketFilter,
    ) -> Result<Vec<Ticket>, SessionError> {
        self.get_query(&format!("{}/tickets", brand_path(brand_id)), &filter.pairs(), Some(token))
            .await
    }

    async fn assign_ticket(&self, token: &str, ticket_id: i64, assignee_id: i64) -> Result<Ticket, SessionError> {
        let body = serde_json::json!({ "assigned_to": assignee_id });
        let path = format!("{}/assign", ticket_path(ticket_id));
        self.send(Method::PUT, &path, &[], Some(token), Some(&body), AuthScope::Session)
            .await
    }

    async fn credits(&self, token: &str, brand_id: i64) -> Result<CreditBalance, SessionError> {
        self.get(&format!("{}/credits", brand_path(brand_id)), Some(token))
            .await
    }

    // The backend reads `amount` as a query parameter, not a JSON body.
    async fn add_credits(&self, token: &str, brand_id: i64, amount: f64) -> Result<CreditTopUp, SessionError> {
        let path = format!("{}/credits", brand_path(brand_id));
        let query = [("amount", amount.to_string())];
        self.send::<_, ()>(Method::POST, &path, &query, Some(token), None, AuthScope::Session)
            .await
    }

    async fn transactions(&self, token: &str, brand_id: i64, page: Page) -> Result<Vec<CreditTransaction>, SessionError> {
        self.get_query(&format!("{}/transactions", brand_path(brand_id)), &page.pairs(), Some(token))
            .await
    }

    async fn analytics(&self, token: &str, brand_id: i64, range: &DateRange) -> Result<BrandAnalytics, SessionError> {
        self.get_query(&format!("{}/analytics", brand_path(brand_id)), &range.pairs(), Some(token))
            .await
    }
}
