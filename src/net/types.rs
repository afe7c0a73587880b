//! Wire DTOs for the ComplaintHub REST backend, plus the resolved `User`.
//!
//! DESIGN
//! ======
//! The backend describes identity with two booleans (`is_admin`,
//! `is_brand`). They are kept on [`User`] as [`RoleFlags`] for access checks,
//! and collapsed once into a [`Role`] when the profile is decoded. Nothing
//! downstream re-derives the role from raw JSON.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use std::collections::BTreeMap;
use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

// =============================================================================
// ROLE
// =============================================================================

/// Role flags as sent by `GET /auth/me`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleFlags {
    pub is_admin: bool,
    pub is_brand: bool,
}

/// Logical role of an authenticated user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Consumer,
    Brand,
    Admin,
}

impl Role {
    /// Collapse wire flags into a role. Brand wins when both flags are set.
    #[must_use]
    pub fn from_flags(flags: RoleFlags) -> Self {
        if flags.is_brand {
            Self::Brand
        } else if flags.is_admin {
            Self::Admin
        } else {
            Self::Consumer
        }
    }

    /// Name used for the persisted role hint and route roles.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Consumer => "user",
            Self::Brand => "brand",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// USER
// =============================================================================

/// `UserRead` as returned by `/auth/me` and `/auth/signup`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(deserialize_with = "deserialize_i64_from_number")]
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub is_brand: bool,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// The resolved identity of the logged-in user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub display_name: String,
    pub email: String,
    pub phone: Option<String>,
    /// ISO 8601 creation timestamp as sent by the backend.
    pub created_at: Option<String>,
    pub flags: RoleFlags,
    pub role: Role,
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        let flags = RoleFlags { is_admin: record.is_admin, is_brand: record.is_brand };
        Self {
            id: record.id,
            display_name: record.name,
            email: record.email,
            phone: record.phone,
            created_at: record.created_at,
            flags,
            role: Role::from_flags(flags),
        }
    }
}

// =============================================================================
// AUTH PAYLOADS
// =============================================================================

/// Login form payload for `POST /auth/login`.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self { email: email.into(), password: password.into() }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Registration payload for `POST /auth/signup`.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct SignupDetails {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
}

impl SignupDetails {
    /// The login credentials implied by this registration.
    #[must_use]
    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.email.clone(), self.password.clone())
    }
}

impl fmt::Debug for SignupDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignupDetails")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("phone", &self.phone)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// `Token` response of `POST /auth/login`.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "bearer".to_owned()
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("access_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .finish()
    }
}

/// Confirmation returned by a successful registration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Registration {
    pub user_id: i64,
    pub email: String,
    pub display_name: String,
}

impl From<UserRecord> for Registration {
    fn from(record: UserRecord) -> Self {
        Self { user_id: record.id, email: record.email, display_name: record.name }
    }
}

// =============================================================================
// TICKETS
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    New,
    Progress,
    Resolved,
}

impl TicketStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Progress => "progress",
            Self::Resolved => "resolved",
        }
    }
}

impl std::str::FromStr for TicketStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "new" => Ok(Self::New),
            "progress" => Ok(Self::Progress),
            "resolved" => Ok(Self::Resolved),
            other => Err(format!("unknown ticket status: {other}")),
        }
    }
}

/// Intake channel of a complaint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Voice,
    Whatsapp,
    Telegram,
    Web,
    Other,
}

impl std::str::FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "voice" => Ok(Self::Voice),
            "whatsapp" => Ok(Self::Whatsapp),
            "telegram" => Ok(Self::Telegram),
            "web" => Ok(Self::Web),
            "other" => Ok(Self::Other),
            other => Err(format!("unknown channel: {other}")),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Complaint,
    Feedback,
    Suggestion,
    Support,
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "complaint" => Ok(Self::Complaint),
            "feedback" => Ok(Self::Feedback),
            "suggestion" => Ok(Self::Suggestion),
            "support" => Ok(Self::Support),
            other => Err(format!("unknown ticket category: {other}")),
        }
    }
}

/// `TicketCreate` payload.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NewTicket {
    pub brand_id: i64,
    pub user_id: Option<i64>,
    pub channel: Channel,
    pub description: String,
    pub category: Category,
}

/// `TicketOut` as returned by the ticket endpoints.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    #[serde(deserialize_with = "deserialize_i64_from_number")]
    pub id: i64,
    #[serde(deserialize_with = "deserialize_i64_from_number")]
    pub brand_id: i64,
    pub user_id: Option<i64>,
    pub channel: Channel,
    pub description: String,
    pub status: TicketStatus,
    #[serde(default)]
    pub sentiment_score: f64,
    /// 0 = low .. 3 = critical.
    #[serde(default)]
    pub urgency: i32,
    #[serde(default)]
    pub abuse_level: i32,
    pub category: Category,
    pub assigned_to: Option<i64>,
    pub created_at: String,
    pub resolved_at: Option<String>,
}

// =============================================================================
// BRANDS
// =============================================================================

/// `GET /brands/{id}/dashboard` summary.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrandDashboard {
    pub new_complaints: u64,
    pub total_active: u64,
    pub avg_rating: f64,
    /// Display string such as `"18h"`.
    pub avg_resolution_time: Option<String>,
    pub urgent_tickets: Vec<Ticket>,
}

/// `GET /brands/{id}/credits`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreditBalance {
    pub balance: f64,
    pub currency: String,
    pub last_updated: Option<String>,
}

/// `POST /brands/{id}/credits` acknowledgement.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreditTopUp {
    pub success: bool,
    pub new_balance: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Credit,
    Debit,
}

/// One row of `GET /brands/{id}/transactions`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CreditTransaction {
    #[serde(deserialize_with = "deserialize_i64_from_number")]
    pub id: i64,
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub ticket_id: Option<i64>,
    pub balance_after: f64,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// `GET /brands/{id}/analytics`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrandAnalytics {
    pub total_tickets: u64,
    pub resolved_tickets: u64,
    /// Percentage, 0..=100.
    pub resolution_rate: f64,
    pub avg_resolution_time_hours: f64,
    pub category_breakdown: BTreeMap<String, u64>,
    pub channel_breakdown: BTreeMap<String, u64>,
    pub satisfaction_scores: Option<serde_json::Value>,
}

/// Optional `start_date`/`end_date` bounds (ISO 8601) for analytics queries.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl DateRange {
    /// Query pairs for the bounds that are set.
    #[must_use]
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        [("start_date", &self.start_date), ("end_date", &self.end_date)]
            .into_iter()
            .filter_map(|(key, value)| value.clone().map(|v| (key, v)))
            .collect()
    }
}

fn deserialize_i64_from_number<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::Number(number) => {
            if let Some(int) = number.as_i64() {
                return Ok(int);
            }
            #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
            if let Some(float) = number.as_f64()
                && float.is_finite()
                && float.fract() == 0.0
                && float >= i64::MIN as f64
                && float <= i64::MAX as f64
            {
                return Ok(float as i64);
            }
            Err(D::Error::custom(format!("expected integer id, got {number}")))
        }
        serde_json::Value::String(s) => s
            .parse::<i64>()
            .map_err(|_| D::Error::custom(format!("expected integer id, got {s:?}"))),
        other => Err(D::Error::custom(format!("expected integer id, got {other}"))),
    }
}
