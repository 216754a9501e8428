//! Requester configuration.
//!
//! Loaded once from environment variables, validated, then treated as
//! immutable for the rest of the run.

use crate::protocol::endpoints::{
    PortalEndpoints, DEFAULT_HOMEPAGE_URL, DEFAULT_LICENSE_URL, DEFAULT_LOGIN_URL,
};
use crate::retry::RetryPolicy;
use crate::RequesterError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::time::Duration;
use zeroize::Zeroizing;

/// Portal user id.
pub const ENV_USER_ID: &str = "NEXACRO_USER_ID";
/// Portal password.
pub const ENV_USER_PASS: &str = "NEXACRO_USER_PASS";
/// Destination address for the license email.
pub const ENV_EMAIL: &str = "NEXACRO_EMAIL";
/// Customer id, defaults to the user id.
pub const ENV_CUSTOMER_ID: &str = "NEXACRO_CUSTOMER_ID";
/// Per-request timeout in seconds.
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "NEXACRO_REQUEST_TIMEOUT_SECS";
/// Total attempts per step for retryable failures.
pub const ENV_MAX_ATTEMPTS: &str = "NEXACRO_MAX_ATTEMPTS";
/// Delay before the first retry, in milliseconds.
pub const ENV_RETRY_BASE_DELAY_MS: &str = "NEXACRO_RETRY_BASE_DELAY_MS";
/// Home page URL override.
pub const ENV_HOMEPAGE_URL: &str = "NEXACRO_HOMEPAGE_URL";
/// Login URL override.
pub const ENV_LOGIN_URL: &str = "NEXACRO_LOGIN_URL";
/// License URL override.
pub const ENV_LICENSE_URL: &str = "NEXACRO_LICENSE_URL";

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is a valid regex")
});

/// Validated settings for one license request run.
///
/// The password lives in a buffer that is zeroed on drop, and the custom
/// `Debug` implementation never prints it.
#[derive(Clone)]
pub struct RequesterConfig {
    /// Portal login id.
    pub user_id: String,

    /// Portal password.
    pub user_pass: Zeroizing<String>,

    /// Customer id sent with the license request.
    pub customer_id: String,

    /// Address the license email is sent to.
    pub email: String,

    /// Timeout applied to every HTTP request.
    pub request_timeout: Duration,

    /// Portal URLs.
    pub endpoints: PortalEndpoints,

    /// Retry policy for network failures.
    pub retry: RetryPolicy,
}

impl fmt::Debug for RequesterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequesterConfig")
            .field("user_id", &mask(&self.user_id))
            .field("user_pass", &"[REDACTED]")
            .field("customer_id", &mask(&self.customer_id))
            .field("email", &self.email)
            .field("request_timeout", &self.request_timeout)
            .field("endpoints", &self.endpoints)
            .field("retry", &self.retry)
            .finish()
    }
}

impl RequesterConfig {
    /// Build a config with default timeout, endpoints and retry policy.
    ///
    /// The customer id defaults to the user id.
    pub fn new(
        user_id: impl Into<String>,
        user_pass: impl Into<String>,
        email: impl Into<String>,
    ) -> Result<Self, RequesterError> {
        let user_id = user_id.into();
        Ok(Self {
            customer_id: user_id.clone(),
            user_id,
            user_pass: Zeroizing::new(user_pass.into()),
            email: email.into(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            endpoints: PortalEndpoints::production()?,
            retry: RetryPolicy::default(),
        })
    }

    /// Load configuration from the process environment and validate it.
    ///
    /// See the `ENV_*` constants for the variables read.
    ///
    /// # Errors
    /// Returns `Configuration` if a required variable is missing (all
    /// missing names are listed), a numeric value does not parse, a URL
    /// override is invalid, or validation fails.
    pub fn from_env() -> Result<Self, RequesterError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Empty values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, RequesterError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let missing: Vec<&str> = [ENV_USER_ID, ENV_USER_PASS, ENV_EMAIL]
            .into_iter()
            .filter(|name| get(*name).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(RequesterError::Configuration(format!(
                "missing required environment variables: {}",
                missing.join(", ")
            )));
        }

        let user_id = get(ENV_USER_ID).unwrap_or_default();
        let user_pass = Zeroizing::new(get(ENV_USER_PASS).unwrap_or_default());
        let email = get(ENV_EMAIL).unwrap_or_default();
        let customer_id = get(ENV_CUSTOMER_ID).unwrap_or_else(|| user_id.clone());

        let request_timeout = match get(ENV_REQUEST_TIMEOUT_SECS) {
            Some(raw) => Duration::from_secs(parse_number(ENV_REQUEST_TIMEOUT_SECS, &raw)?),
            None => DEFAULT_REQUEST_TIMEOUT,
        };

        let mut retry = RetryPolicy::default();
        if let Some(raw) = get(ENV_MAX_ATTEMPTS) {
            retry.max_attempts = parse_number(ENV_MAX_ATTEMPTS, &raw)? as u32;
        }
        if let Some(raw) = get(ENV_RETRY_BASE_DELAY_MS) {
            retry.base_delay = Duration::from_millis(parse_number(ENV_RETRY_BASE_DELAY_MS, &raw)?);
        }

        let endpoints = PortalEndpoints::parse(
            &get(ENV_HOMEPAGE_URL).unwrap_or_else(|| DEFAULT_HOMEPAGE_URL.to_string()),
            &get(ENV_LOGIN_URL).unwrap_or_else(|| DEFAULT_LOGIN_URL.to_string()),
            &get(ENV_LICENSE_URL).unwrap_or_else(|| DEFAULT_LICENSE_URL.to_string()),
        )?;

        let config = Self {
            user_id,
            user_pass,
            customer_id,
            email,
            request_timeout,
            endpoints,
            retry,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration for obvious errors.
    pub fn validate(&self) -> Result<(), RequesterError> {
        for (name, value) in [
            ("user_id", self.user_id.as_str()),
            ("user_pass", self.user_pass.as_str()),
            ("customer_id", self.customer_id.as_str()),
            ("email", self.email.as_str()),
        ] {
            if value.trim().is_empty() {
                return Err(RequesterError::Configuration(format!(
                    "{} cannot be empty",
                    name
                )));
            }
        }
        if !EMAIL_PATTERN.is_match(&self.email) {
            return Err(RequesterError::Configuration(format!(
                "invalid email format: {}",
                self.email
            )));
        }
        if self.request_timeout.is_zero() {
            return Err(RequesterError::Configuration(
                "request_timeout must be greater than zero".to_string(),
            ));
        }
        self.retry.validate()
    }

    /// User id safe to put in a log line.
    pub fn masked_user_id(&self) -> String {
        mask(&self.user_id)
    }

    /// Customer id safe to put in a log line.
    pub fn masked_customer_id(&self) -> String {
        mask(&self.customer_id)
    }
}

/// Keep the first two characters of an identifier and star the rest.
pub fn mask(value: &str) -> String {
    let shown: String = value.chars().take(2).collect();
    let hidden = value.chars().count().saturating_sub(2);
    format!("{}{}", shown, "*".repeat(hidden.max(1)))
}

fn parse_number(name: &str, raw: &str) -> Result<u64, RequesterError> {
    raw.trim().parse::<u64>().map_err(|_| {
        RequesterError::Configuration(format!("{} must be a non-negative integer, got {:?}", name, raw))
    })
}
