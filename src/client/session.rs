//! Portal session: cookie acquisition, login, license request.
//!
//! A [`PortalSession`] owns its transport for one run. The three calls share
//! the transport's cookie jar and must be made in order. The transport is
//! closed by [`PortalSession::close`] or, failing that, on drop.

use crate::client::http::PortalTransport;
use crate::config::RequesterConfig;
use crate::protocol::endpoints::PortalEndpoints;
use crate::protocol::payload::{build_license_params, build_login_xml, LOGIN_CONTENT_TYPE};
use crate::validate::{classify, Step};
use crate::RequesterError;
use tracing::debug;

/// One cookie-bearing session against the portal.
pub struct PortalSession<T: PortalTransport> {
    transport: T,
    endpoints: PortalEndpoints,
    closed: bool,
}

impl<T: PortalTransport> PortalSession<T> {
    /// Open a session over `transport`.
    pub fn open(transport: T, endpoints: PortalEndpoints) -> Self {
        Self {
            transport,
            endpoints,
            closed: false,
        }
    }

    /// GET the home page so the portal issues session cookies.
    ///
    /// Returns the names of the cookies received.
    ///
    /// # Errors
    /// * `Network` - connection failure, timeout, or non-2xx status
    pub fn establish_session(&mut self) -> Result<Vec<String>, RequesterError> {
        let outcome = self.transport.get(&self.endpoints.homepage, &[]);
        classify(Step::EstablishSession, &outcome).into_result(Step::EstablishSession)?;

        let cookies = outcome.map(|r| r.cookies).unwrap_or_default();
        debug!(cookies = ?cookies, "Session cookies received");
        Ok(cookies)
    }

    /// POST the XML login with the configured credentials.
    ///
    /// # Errors
    /// * `Network` - connection failure or timeout
    /// * `Authentication` - failure marker, or no success marker
    pub fn login(&mut self, config: &RequesterConfig) -> Result<(), RequesterError> {
        let body = build_login_xml(&config.user_id, &config.user_pass);
        let outcome = self
            .transport
            .post(&self.endpoints.login, LOGIN_CONTENT_TYPE, body);
        classify(Step::Login, &outcome).into_result(Step::Login)
    }

    /// GET the license endpoint for the configured customer and email.
    ///
    /// # Errors
    /// * `Network` - connection failure or timeout
    /// * `LicenseRequest` - failure marker, or no success marker
    pub fn request_license(&mut self, config: &RequesterConfig) -> Result<(), RequesterError> {
        let params = build_license_params(&config.customer_id, &config.email);
        let outcome = self.transport.get(&self.endpoints.license, &params);
        classify(Step::LicenseRequest, &outcome).into_result(Step::LicenseRequest)
    }

    /// Run one step by name.
    pub fn run_step(&mut self, step: Step, config: &RequesterConfig) -> Result<(), RequesterError> {
        match step {
            Step::EstablishSession => self.establish_session().map(|_| ()),
            Step::Login => self.login(config),
            Step::LicenseRequest => self.request_license(config),
        }
    }

    /// Release the transport. Safe to call more than once.
    pub fn close(&mut self) {
        if !self.closed {
            self.transport.close();
            self.closed = true;
            debug!("Portal session closed");
        }
    }

    /// Whether the session has been closed.
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl<T: PortalTransport> Drop for PortalSession<T> {
    fn drop(&mut self) {
        self.close();
    }
}
