//! License requester - the workflow entry point.
//!
//! The `LicenseRequester` runs one request end to end:
//! - opens a portal session
//! - establishes cookies, logs in, requests the license email
//! - retries network failures under the configured policy
//! - closes the session on every path and reports the outcome

use crate::client::http::{PortalTransport, ReqwestTransport};
use crate::client::session::PortalSession;
use crate::clock::{Clock, SystemClock};
use crate::config::RequesterConfig;
use crate::errors::ErrorKind;
use crate::validate::Step;
use crate::RequesterError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Attempts made for one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepRecord {
    /// Which step.
    pub step: Step,
    /// Attempts made, including the first.
    pub attempts: u32,
    /// Whether the step succeeded.
    pub succeeded: bool,
}

/// Reason a run failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureSummary {
    /// Failure kind.
    pub kind: ErrorKind,
    /// Human-readable reason.
    pub message: String,
}

/// Summary of one license request run.
///
/// Safe to log and to persist: ids are masked, the password is never
/// included.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Whether all three steps succeeded.
    pub success: bool,

    /// When the run started.
    pub started_at: DateTime<Utc>,

    /// When the run finished.
    pub finished_at: DateTime<Utc>,

    /// Masked user id.
    pub user: String,

    /// Masked customer id.
    pub customer: String,

    /// Destination email.
    pub email: String,

    /// Per-step attempts, in execution order. Steps never reached are absent.
    pub steps: Vec<StepRecord>,

    /// Failure reason, if the run failed.
    pub failure: Option<FailureSummary>,

    #[serde(skip)]
    error: Option<RequesterError>,
}

impl RunReport {
    /// The run's outcome as a `Result`.
    pub fn result(&self) -> Result<(), RequesterError> {
        match &self.error {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    /// The error that ended the run, if any.
    pub fn error(&self) -> Option<&RequesterError> {
        self.error.as_ref()
    }

    /// Process exit code: 0 on success, the error kind's code otherwise.
    pub fn exit_code(&self) -> u8 {
        self.error.as_ref().map_or(0, RequesterError::exit_code)
    }

    /// Serialize the report as pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write the report as JSON to `path`.
    pub fn write_json(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = self.to_json().map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }
}

/// Runs the three-step license request against the portal.
pub struct LicenseRequester {
    config: RequesterConfig,
    clock: Arc<dyn Clock>,
}

impl LicenseRequester {
    /// Create a requester with the given configuration.
    ///
    /// Uses the system clock for timestamps and retry delays.
    ///
    /// # Errors
    /// Returns `Configuration` if the configuration does not validate.
    pub fn new(config: RequesterConfig) -> Result<Self, RequesterError> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a requester with a custom clock.
    pub fn with_clock(
        config: RequesterConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, RequesterError> {
        config.validate()?;
        Ok(Self { config, clock })
    }

    /// Run the workflow over a fresh reqwest session.
    pub fn run(&self) -> RunReport {
        match ReqwestTransport::new(&self.config) {
            Ok(transport) => self.run_with(transport),
            Err(e) => {
                let started_at = self.clock.now_utc();
                self.finish(started_at, Vec::new(), Err(e))
            }
        }
    }

    /// Run the workflow over the given transport.
    ///
    /// The transport is owned by the session for the duration of the run
    /// and closed before this returns.
    pub fn run_with<T: PortalTransport>(&self, transport: T) -> RunReport {
        let started_at = self.clock.now_utc();
        info!(
            user = %self.config.masked_user_id(),
            customer = %self.config.masked_customer_id(),
            email = %self.config.email,
            "Starting license request workflow"
        );
        debug!(config = ?self.config, "Effective configuration");

        let mut steps = Vec::with_capacity(Step::ALL.len());
        let mut session = PortalSession::open(transport, self.config.endpoints.clone());
        let result = self.run_steps(&mut session, &mut steps);
        session.close();

        self.finish(started_at, steps, result)
    }

    fn run_steps<T: PortalTransport>(
        &self,
        session: &mut PortalSession<T>,
        steps: &mut Vec<StepRecord>,
    ) -> Result<(), RequesterError> {
        for step in Step::ALL {
            info!(
                step = %step,
                "Step {}/{}: {}",
                step.number(),
                Step::ALL.len(),
                describe(step)
            );

            let outcome = self
                .config
                .retry
                .run(step, self.clock.as_ref(), || session.run_step(step, &self.config));

            steps.push(StepRecord {
                step,
                attempts: outcome.attempts,
                succeeded: outcome.result.is_ok(),
            });

            match outcome.result {
                Ok(()) => info!(step = %step, attempts = outcome.attempts, "Step completed"),
                Err(e) => {
                    error!(
                        step = %step,
                        attempts = outcome.attempts,
                        kind = %e.kind(),
                        error = %e,
                        "Step failed"
                    );
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    fn finish(
        &self,
        started_at: DateTime<Utc>,
        steps: Vec<StepRecord>,
        result: Result<(), RequesterError>,
    ) -> RunReport {
        let error = result.err();
        let report = RunReport {
            success: error.is_none(),
            started_at,
            finished_at: self.clock.now_utc(),
            user: self.config.masked_user_id(),
            customer: self.config.masked_customer_id(),
            email: self.config.email.clone(),
            steps,
            failure: error.as_ref().map(|e| FailureSummary {
                kind: e.kind(),
                message: e.to_string(),
            }),
            error,
        };

        match &report.failure {
            None => info!(
                customer = %report.customer,
                email = %report.email,
                "License request succeeded, email requested"
            ),
            Some(failure) => error!(
                kind = %failure.kind,
                reason = %failure.message,
                exit_code = report.exit_code(),
                "License request failed"
            ),
        }

        report
    }

    /// Get the current configuration.
    pub fn config(&self) -> &RequesterConfig {
        &self.config
    }
}

fn describe(step: Step) -> &'static str {
    match step {
        Step::EstablishSession => "Establishing session",
        Step::Login => "Logging in",
        Step::LicenseRequest => "Requesting license email",
    }
}
