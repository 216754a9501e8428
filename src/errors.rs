//! Requester error types.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Closed set of failure kinds a run can end with.
///
/// Callers branch on the kind (retry decisions, exit codes) rather than on
/// the error message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Connection, timeout or unusable-portal problem. Retryable.
    Network,
    /// The portal rejected the login.
    Authentication,
    /// The portal rejected (or did not confirm) the license request.
    LicenseRequest,
    /// Required settings are missing or invalid.
    Configuration,
}

impl ErrorKind {
    /// Process exit code reported to the scheduler for this kind.
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorKind::Configuration => 2,
            ErrorKind::Network => 3,
            ErrorKind::Authentication => 4,
            ErrorKind::LicenseRequest => 5,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Network => "network",
            ErrorKind::Authentication => "authentication",
            ErrorKind::LicenseRequest => "license_request",
            ErrorKind::Configuration => "configuration",
        };
        f.write_str(name)
    }
}

/// Errors that can end a license request run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequesterError {
    /// Transport-level failure while talking to the portal.
    #[error("Network error during {step}: {message}")]
    Network {
        /// Name of the step that failed.
        step: &'static str,
        /// What went wrong.
        message: String,
    },

    /// Credentials rejected, or the login response could not be confirmed.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// License request rejected, or its response could not be confirmed.
    #[error("License request failed: {0}")]
    LicenseRequest(String),

    /// Configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl RequesterError {
    /// The failure kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RequesterError::Network { .. } => ErrorKind::Network,
            RequesterError::Authentication(_) => ErrorKind::Authentication,
            RequesterError::LicenseRequest(_) => ErrorKind::LicenseRequest,
            RequesterError::Configuration(_) => ErrorKind::Configuration,
        }
    }

    /// Exit code for this error.
    pub fn exit_code(&self) -> u8 {
        self.kind().exit_code()
    }
}
