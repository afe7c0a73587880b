//! Client configuration parsed from environment variables.

use std::path::PathBuf;

use crate::guard::RedirectPolicy;
use crate::session::SignupPolicy;

pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000/api/v1";
pub const DEFAULT_STORAGE_PATH: &str = ".complainthub/session.json";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A configuration value could not be parsed.
    #[error("config parse failed: {0}")]
    Parse(String),

    /// A required value is empty.
    #[error("missing config value: {var}")]
    Missing { var: String },

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub storage_path: PathBuf,
    pub timeouts: HttpTimeouts,
    pub signup_policy: SignupPolicy,
    pub redirect_policy: RedirectPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_owned(),
            storage_path: PathBuf::from(DEFAULT_STORAGE_PATH),
            timeouts: HttpTimeouts::default(),
            signup_policy: SignupPolicy::default(),
            redirect_policy: RedirectPolicy::default(),
        }
    }
}

impl ClientConfig {
    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `COMPLAINTHUB_API_BASE_URL`: default `http://127.0.0.1:8000/api/v1`
    /// - `COMPLAINTHUB_STORAGE_PATH`: default `.complainthub/session.json`
    /// - `COMPLAINTHUB_REQUEST_TIMEOUT_SECS`: default 30
    /// - `COMPLAINTHUB_CONNECT_TIMEOUT_SECS`: default 10
    /// - `COMPLAINTHUB_SIGNUP_POLICY`: `auto_login` (default) or `require_login`
    /// - `COMPLAINTHUB_REDIRECT_POLICY`: `role_home` (default) or `public_landing`
    ///
    /// # Errors
    ///
    /// Returns an error if a policy value is unknown or the base URL is empty.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_base_url = normalize_base_url(
            &std::env::var("COMPLAINTHUB_API_BASE_URL").unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_owned()),
        )?;
        let storage_path = std::env::var("COMPLAINTHUB_STORAGE_PATH")
            .map_or_else(|_| PathBuf::from(DEFAULT_STORAGE_PATH), PathBuf::from);
        let timeouts = HttpTimeouts {
            request_secs: env_parse_u64("COMPLAINTHUB_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse_u64("COMPLAINTHUB_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        };
        let signup_policy = parse_signup_policy(std::env::var("COMPLAINTHUB_SIGNUP_POLICY").ok().as_deref())?;
        let redirect_policy = parse_redirect_policy(std::env::var("COMPLAINTHUB_REDIRECT_POLICY").ok().as_deref())?;

        Ok(Self { api_base_url, storage_path, timeouts, signup_policy, redirect_policy })
    }
}

fn env_parse_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

pub(crate) fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(ConfigError::Missing { var: "COMPLAINTHUB_API_BASE_URL".into() });
    }
    Ok(trimmed.to_owned())
}

fn parse_signup_policy(raw: Option<&str>) -> Result<SignupPolicy, ConfigError> {
    match raw.map(str::trim).unwrap_or("auto_login") {
        "auto_login" => Ok(SignupPolicy::AutoLogin),
        "require_login" => Ok(SignupPolicy::RequireLogin),
        other => Err(ConfigError::Parse(format!(
            "unknown COMPLAINTHUB_SIGNUP_POLICY '{other}' (expected 'auto_login' or 'require_login')"
        ))),
    }
}

fn parse_redirect_policy(raw: Option<&str>) -> Result<RedirectPolicy, ConfigError> {
    match raw.map(str::trim).unwrap_or("role_home") {
        "role_home" => Ok(RedirectPolicy::RoleHome),
        "public_landing" => Ok(RedirectPolicy::PublicLanding),
        other => Err(ConfigError::Parse(format!(
            "unknown COMPLAINTHUB_REDIRECT_POLICY '{other}' (expected 'role_home' or 'public_landing')"
        ))),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
