//! End-to-end runs against a local mock portal.
//!
//! The requester uses a blocking client, so each run happens on a
//! `spawn_blocking` thread while wiremock serves on the async runtime.

use nexacro_license::protocol::endpoints::PortalEndpoints;
use nexacro_license::{ErrorKind, LicenseRequester, RequesterConfig, RunReport};
use std::time::Duration;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const HOME_PATH: &str = "/Support/";
const LOGIN_PATH: &str = "/Next_JSP/CS-Homepage/Next_JSP/Login/Login_new.jsp";
const LICENSE_PATH: &str = "/FrontControllerServlet.do";
const SESSION_COOKIE: &str = "JSESSIONID=abc123";

fn test_config(base: &str) -> RequesterConfig {
    let mut config = RequesterConfig::new("tester01", "pw-integration", "ops@example.com").unwrap();
    config.endpoints = PortalEndpoints::under(base).unwrap();
    config.request_timeout = Duration::from_secs(5);
    config.retry.base_delay = Duration::from_millis(10);
    config
}

async fn run_against(server: &MockServer) -> RunReport {
    let config = test_config(&server.uri());
    tokio::task::spawn_blocking(move || LicenseRequester::new(config).unwrap().run())
        .await
        .unwrap()
}

async fn mount_home(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(HOME_PATH))
        .and(query_param("menu", "home"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "JSESSIONID=abc123; Path=/")
                .set_body_string("<html>home</html>"),
        )
        .mount(server)
        .await;
}

async fn mount_login(server: &MockServer, body: &str) {
    Mock::given(method("POST"))
        .and(path(LOGIN_PATH))
        .and(header("cookie", SESSION_COOKIE))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn session_cookie_is_carried_through_login_and_license() {
    let server = MockServer::start().await;
    mount_home(&server).await;

    Mock::given(method("POST"))
        .and(path(LOGIN_PATH))
        .and(header("content-type", "text/xml; charset=UTF-8"))
        .and(header("cookie", SESSION_COOKIE))
        .and(body_string_contains("<Col id=\"userId\">tester01</Col>"))
        .and(body_string_contains("<Col id=\"userPass\">pw-integration</Col>"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<Result>SUCCESS</Result>"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(LICENSE_PATH))
        .and(header("cookie", SESSION_COOKIE))
        .and(query_param("model", "CE_LicenseEMailSend_R01"))
        .and(query_param("p_CustomID", "tester01"))
        .and(query_param("p_Email", "ops@example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<Result>SUCCESS</Result>"))
        .expect(1)
        .mount(&server)
        .await;

    let report = run_against(&server).await;

    assert!(report.success, "failure: {:?}", report.failure);
    assert_eq!(report.exit_code(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn rejected_login_skips_license_request() {
    let server = MockServer::start().await;
    mount_home(&server).await;
    mount_login(&server, "<Result>FAIL</Result>").await;

    Mock::given(method("GET"))
        .and(path(LICENSE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("SUCCESS"))
        .expect(0)
        .mount(&server)
        .await;

    let report = run_against(&server).await;

    assert!(!report.success);
    assert_eq!(report.exit_code(), ErrorKind::Authentication.exit_code());
    assert_eq!(report.steps.len(), 2);
    assert_eq!(report.steps[1].attempts, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn empty_license_response_is_reported_as_failure() {
    let server = MockServer::start().await;
    mount_home(&server).await;
    mount_login(&server, "SUCCESS").await;

    Mock::given(method("GET"))
        .and(path(LICENSE_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let report = run_against(&server).await;

    assert!(!report.success);
    assert_eq!(
        report.failure.as_ref().map(|f| f.kind),
        Some(ErrorKind::LicenseRequest)
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn unavailable_home_page_is_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(HOME_PATH))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    mount_home(&server).await;
    mount_login(&server, "SUCCESS").await;

    Mock::given(method("GET"))
        .and(path(LICENSE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("SUCCESS"))
        .mount(&server)
        .await;

    let report = run_against(&server).await;

    assert!(report.success, "failure: {:?}", report.failure);
    assert_eq!(report.steps[0].attempts, 3);
}

#[test]
fn unreachable_portal_surfaces_network_error() {
    let mut config = test_config("http://127.0.0.1:1");
    config.retry.max_attempts = 2;

    let report = LicenseRequester::new(config).unwrap().run();

    assert!(!report.success);
    assert_eq!(report.exit_code(), ErrorKind::Network.exit_code());
    assert_eq!(report.steps.len(), 1);
    assert_eq!(report.steps[0].attempts, 2);
}
