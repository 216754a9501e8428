//! Portal endpoint URLs.

use crate::RequesterError;
use reqwest::Url;

/// Default portal home page (issues the session cookie).
pub const DEFAULT_HOMEPAGE_URL: &str = "https://support.tobesoft.co.kr/Support/?menu=home";

/// Default login endpoint (accepts the XML login body).
pub const DEFAULT_LOGIN_URL: &str =
    "https://support.tobesoft.co.kr/Next_JSP/CS-Homepage/Next_JSP/Login/Login_new.jsp";

/// Default license-email endpoint.
pub const DEFAULT_LICENSE_URL: &str = "https://next.tobesoft.com/FrontControllerServlet.do";

/// User-Agent sent with every request. The portal serves browsers only.
pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";

/// The three portal URLs a run talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalEndpoints {
    /// Home page fetched to obtain session cookies.
    pub homepage: Url,
    /// XML login endpoint.
    pub login: Url,
    /// License-email request endpoint.
    pub license: Url,
}

impl PortalEndpoints {
    /// Build endpoints from raw URL strings.
    ///
    /// # Errors
    /// Returns `Configuration` naming the first URL that fails to parse.
    pub fn parse(homepage: &str, login: &str, license: &str) -> Result<Self, RequesterError> {
        Ok(Self {
            homepage: parse_url("homepage", homepage)?,
            login: parse_url("login", login)?,
            license: parse_url("license", license)?,
        })
    }

    /// The production portal endpoints.
    pub fn production() -> Result<Self, RequesterError> {
        Self::parse(DEFAULT_HOMEPAGE_URL, DEFAULT_LOGIN_URL, DEFAULT_LICENSE_URL)
    }

    /// Endpoints rooted at a single base URL, for local mock servers.
    ///
    /// Paths mirror the production layout.
    pub fn under(base: &str) -> Result<Self, RequesterError> {
        let base = base.trim_end_matches('/');
        Self::parse(
            &format!("{}/Support/?menu=home", base),
            &format!("{}/Next_JSP/CS-Homepage/Next_JSP/Login/Login_new.jsp", base),
            &format!("{}/FrontControllerServlet.do", base),
        )
    }
}

fn parse_url(name: &str, raw: &str) -> Result<Url, RequesterError> {
    Url::parse(raw)
        .map_err(|e| RequesterError::Configuration(format!("invalid {} URL {:?}: {}", name, raw, e)))
}
