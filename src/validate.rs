//! Classification of portal responses into step outcomes.
//!
//! The portal signals its verdict with plain-text markers in the response
//! body, not with status codes. Order of the checks:
//! 1. Transport failure → `NetworkFailure`
//! 2. Failure marker present → the step's domain failure
//! 3. Success marker present → `Success`
//! 4. Anything else → the step's domain failure
//!
//! A body carrying both markers is a failure. An HTTP 200 with neither
//! marker is a failure.

use crate::client::http::{PortalResponse, TransportError};
use crate::RequesterError;
use serde::Serialize;
use std::fmt;

/// Body marker the portal uses to report success.
pub const SUCCESS_MARKER: &str = "SUCCESS";

/// Body marker the portal uses to report failure.
pub const FAILURE_MARKER: &str = "FAIL";

/// One of the three portal calls, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// GET the home page to obtain session cookies.
    EstablishSession,
    /// POST the XML login.
    Login,
    /// GET the license-email endpoint.
    LicenseRequest,
}

impl Step {
    /// All steps in execution order.
    pub const ALL: [Step; 3] = [Step::EstablishSession, Step::Login, Step::LicenseRequest];

    /// Stable name used in logs and errors.
    pub fn name(self) -> &'static str {
        match self {
            Step::EstablishSession => "establish_session",
            Step::Login => "login",
            Step::LicenseRequest => "license_request",
        }
    }

    /// 1-based position of the step.
    pub fn number(self) -> usize {
        match self {
            Step::EstablishSession => 1,
            Step::Login => 2,
            Step::LicenseRequest => 3,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of a single portal call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepResult {
    /// The call did what it was supposed to.
    Success,

    /// Connection-level problem. Retryable.
    NetworkFailure {
        /// What went wrong.
        message: String,
    },

    /// The login was rejected or not confirmed.
    AuthFailure {
        /// HTTP status, when a response arrived.
        status: Option<u16>,
        /// What went wrong.
        message: String,
    },

    /// The license request was rejected or not confirmed.
    RequestFailure {
        /// HTTP status, when a response arrived.
        status: Option<u16>,
        /// What went wrong.
        message: String,
    },
}

impl StepResult {
    /// Whether this is `Success`.
    pub fn is_success(&self) -> bool {
        matches!(self, StepResult::Success)
    }

    /// Convert into the error taxonomy.
    pub fn into_result(self, step: Step) -> Result<(), RequesterError> {
        match self {
            StepResult::Success => Ok(()),
            StepResult::NetworkFailure { message } => Err(RequesterError::Network {
                step: step.name(),
                message,
            }),
            StepResult::AuthFailure { message, .. } => Err(RequesterError::Authentication(message)),
            StepResult::RequestFailure { message, .. } => {
                Err(RequesterError::LicenseRequest(message))
            }
        }
    }
}

/// Classify the outcome of a portal call.
pub fn classify(step: Step, outcome: &Result<PortalResponse, TransportError>) -> StepResult {
    match outcome {
        Ok(response) => classify_response(step, response.status, &response.body),
        Err(e) => StepResult::NetworkFailure {
            message: e.to_string(),
        },
    }
}

/// Classify a received response by status and body.
///
/// The session step has no markers: any 2xx is success, anything else is
/// treated as the portal being unreachable.
pub fn classify_response(step: Step, status: u16, body: &str) -> StepResult {
    if step == Step::EstablishSession {
        return if is_success_status(status) {
            StepResult::Success
        } else {
            StepResult::NetworkFailure {
                message: format!("home page returned HTTP {}", status),
            }
        };
    }

    let upper = body.to_uppercase();

    // Failure marker wins over success marker.
    if upper.contains(FAILURE_MARKER) {
        return domain_failure(step, status, "portal reported failure");
    }

    if upper.contains(SUCCESS_MARKER) {
        return StepResult::Success;
    }

    if is_success_status(status) {
        domain_failure(step, status, "response carried no success marker")
    } else {
        domain_failure(step, status, "unexpected HTTP status without marker")
    }
}

fn domain_failure(step: Step, status: u16, reason: &str) -> StepResult {
    let message = format!("{} (HTTP {})", reason, status);
    match step {
        Step::Login => StepResult::AuthFailure {
            status: Some(status),
            message,
        },
        Step::LicenseRequest => StepResult::RequestFailure {
            status: Some(status),
            message,
        },
        Step::EstablishSession => StepResult::NetworkFailure { message },
    }
}

fn is_success_status(status: u16) -> bool {
    (200..300).contains(&status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn response(status: u16, body: &str) -> PortalResponse {
        PortalResponse {
            status,
            body: body.to_string(),
            cookies: Vec::new(),
        }
    }

    #[test]
    fn login_success_marker() {
        let result = classify_response(
            Step::Login,
            200,
            "<?xml version=\"1.0\"?><Root><Result>SUCCESS</Result></Root>",
        );
        assert_eq!(result, StepResult::Success);
    }

    #[test]
    fn login_failure_marker() {
        let result = classify_response(Step::Login, 200, "<Result>FAIL</Result>");
        assert!(matches!(result, StepResult::AuthFailure { status: Some(200), .. }));
    }

    #[test]
    fn both_markers_is_failure() {
        let body = "<Result>SUCCESS</Result><ErrorCode>FAIL</ErrorCode>";
        assert!(matches!(
            classify_response(Step::Login, 200, body),
            StepResult::AuthFailure { .. }
        ));
        assert!(matches!(
            classify_response(Step::LicenseRequest, 200, body),
            StepResult::RequestFailure { .. }
        ));
    }

    #[test]
    fn bare_200_is_never_success() {
        assert!(matches!(
            classify_response(Step::Login, 200, ""),
            StepResult::AuthFailure { .. }
        ));
        assert!(matches!(
            classify_response(Step::LicenseRequest, 200, ""),
            StepResult::RequestFailure { .. }
        ));
        assert!(matches!(
            classify_response(Step::LicenseRequest, 200, "<html>welcome</html>"),
            StepResult::RequestFailure { .. }
        ));
    }

    #[test]
    fn markers_are_case_insensitive() {
        assert_eq!(
            classify_response(Step::LicenseRequest, 200, "result=success"),
            StepResult::Success
        );
        assert!(matches!(
            classify_response(Step::LicenseRequest, 200, "result=Failed"),
            StepResult::RequestFailure { .. }
        ));
    }

    #[test]
    fn non_2xx_without_marker_is_domain_failure() {
        match classify_response(Step::Login, 500, "Internal Server Error") {
            StepResult::AuthFailure { status, message } => {
                assert_eq!(status, Some(500));
                assert!(message.contains("HTTP 500"));
            }
            other => panic!("expected auth failure, got {:?}", other),
        }
    }

    #[test]
    fn non_2xx_with_success_marker_follows_marker() {
        assert_eq!(
            classify_response(Step::LicenseRequest, 302, "SUCCESS"),
            StepResult::Success
        );
    }

    #[test]
    fn establish_session_uses_status_only() {
        assert_eq!(
            classify_response(Step::EstablishSession, 200, "FAIL"),
            StepResult::Success
        );
        assert!(matches!(
            classify_response(Step::EstablishSession, 503, ""),
            StepResult::NetworkFailure { .. }
        ));
    }

    #[test]
    fn transport_error_is_network_failure() {
        for step in Step::ALL {
            let outcome = Err(TransportError::Timeout("operation timed out".to_string()));
            assert!(matches!(
                classify(step, &outcome),
                StepResult::NetworkFailure { .. }
            ));
        }
    }

    #[test]
    fn classify_delegates_to_response() {
        let outcome = Ok(response(200, "SUCCESS"));
        assert_eq!(classify(Step::Login, &outcome), StepResult::Success);
    }

    #[test]
    fn into_result_maps_kinds() {
        assert_eq!(StepResult::Success.into_result(Step::Login), Ok(()));

        let err = StepResult::NetworkFailure {
            message: "refused".into(),
        }
        .into_result(Step::Login)
        .unwrap_err();
        assert_eq!(
            err,
            RequesterError::Network {
                step: "login",
                message: "refused".into()
            }
        );

        let err = StepResult::RequestFailure {
            status: Some(200),
            message: "no marker".into(),
        }
        .into_result(Step::LicenseRequest)
        .unwrap_err();
        assert!(matches!(err, RequesterError::LicenseRequest(_)));
    }

    #[test]
    fn step_order_and_names() {
        let names: Vec<&str> = Step::ALL.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["establish_session", "login", "license_request"]);
        assert_eq!(Step::LicenseRequest.number(), 3);
    }

    proptest! {
        #[test]
        fn failure_marker_always_wins(
            prefix in "[a-zA-Z0-9 <>/]{0,20}",
            middle in "[a-zA-Z0-9 <>/]{0,20}",
            suffix in "[a-zA-Z0-9 <>/]{0,20}",
            status in 100u16..600,
            fail_first in any::<bool>(),
        ) {
            let body = if fail_first {
                format!("{}FAIL{}SUCCESS{}", prefix, middle, suffix)
            } else {
                format!("{}SUCCESS{}FAIL{}", prefix, middle, suffix)
            };

            prop_assert!(
                matches!(
                    classify_response(Step::Login, status, &body),
                    StepResult::AuthFailure { .. }
                ),
                "expected auth failure, body: {}",
                body
            );
            prop_assert!(
                matches!(
                    classify_response(Step::LicenseRequest, status, &body),
                    StepResult::RequestFailure { .. }
                ),
                "expected request failure, body: {}",
                body
            );
        }

        #[test]
        fn success_requires_marker(body in "[a-z0-9 <>/=]{0,64}", status in 200u16..300) {
            // Uppercasing can spell a marker; skip those bodies.
            let upper = body.to_uppercase();
            prop_assume!(!upper.contains(SUCCESS_MARKER) && !upper.contains(FAILURE_MARKER));

            prop_assert!(!classify_response(Step::Login, status, &body).is_success());
            prop_assert!(!classify_response(Step::LicenseRequest, status, &body).is_success());
        }
    }
}
