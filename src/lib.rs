//! # nexacro-license
//!
//! **Scheduled license-email requests against the TOBESOFT support portal.**
//!
//! The portal hands out Nexacro license files by email. Getting one takes
//! three calls in a single cookie session:
//!
//! 1. GET the home page to obtain session cookies
//! 2. POST an XML login
//! 3. GET the license-email endpoint for a customer id and address
//!
//! The portal answers with plain-text markers rather than status codes, so
//! every response is checked for the failure marker first, then for the
//! success marker. A bare HTTP 200 is never taken as success.
//!
//! ## Quickstart
//!
//! ```no_run
//! use nexacro_license::{LicenseRequester, RequesterConfig};
//!
//! fn main() -> Result<(), nexacro_license::RequesterError> {
//!     let config = RequesterConfig::from_env()?;
//!     let requester = LicenseRequester::new(config)?;
//!
//!     let report = requester.run();
//!     if report.success {
//!         println!("License email requested for {}", report.email);
//!     }
//!     report.result()
//! }
//! ```
//!
//! ## Failure handling
//!
//! - **Network** failures (timeouts, refused connections) are retried with
//!   exponential backoff, up to a bounded number of attempts
//! - **Authentication** and **license request** failures end the run at once
//! - **Configuration** failures are reported before any network call
//!
//! Each kind maps to its own process exit code. The password never reaches
//! a log line or a run report.

#![deny(missing_docs)]

// Core modules
pub mod clock;
pub mod config;
pub mod errors;

// Wire format
pub mod protocol;

// Client layer
pub mod client;

// Response classification and retry
pub mod retry;
pub mod validate;

// Workflow (main public API)
pub mod manager;

// Binary support
pub mod logging;

// Re-exports for public API
pub use clock::{Clock, SystemClock};
pub use config::RequesterConfig;
pub use errors::{ErrorKind, RequesterError};
pub use manager::{LicenseRequester, RunReport};
pub use retry::RetryPolicy;
pub use validate::{Step, StepResult};

#[cfg(any(test, feature = "test-seams"))]
pub use clock::MockClock;
#[cfg(any(test, feature = "test-seams"))]
pub use client::http::ScriptedTransport;
