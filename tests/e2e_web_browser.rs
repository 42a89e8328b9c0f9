//! End-to-End Test Suite: Web browser request flows
//!
//! Drives the public `WebBrowser` operations against mock servers: redirect
//! chains, custom scheme redirects, POST downgrades, retries and downloads.

use std::sync::Arc;

use serde::Deserialize;
use steamweb_http::{TransportTuning, WebBrowser, WebBrowserConfig};
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

#[derive(Debug, Deserialize)]
struct ApiResponse {
    success: u8,
}

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn browser() -> WebBrowser {
    init_logging();
    // Other tests in this binary may have initialized tuning already.
    let _ = steamweb_http::init(TransportTuning::default());
    WebBrowser::new(WebBrowserConfig::default()).expect("Failed to create web browser")
}

async fn mount_redirects(server: &MockServer, hops: usize) {
    for hop in 0..hops {
        Mock::given(method("GET"))
            .and(path(format!("/r/{hop}")))
            .respond_with(
                ResponseTemplate::new(302)
                    .insert_header("Location", format!("{}/r/{}", server.uri(), hop + 1)),
            )
            .mount(server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path(format!("/r/{hops}")))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"success\": 1}"))
        .mount(server)
        .await;
}

/// Login flow: POST credentials, get bounced with 303 to the mobile app
/// scheme after a normal redirect.
#[tokio::test]
async fn test_mobile_login_flow() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/mobilelogin/dologin"))
        .respond_with(ResponseTemplate::new(303).insert_header("Location", "/mobilelogin/done"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/mobilelogin/done"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "steammobile://start"))
        .expect(1)
        .mount(&server)
        .await;

    let response = browser()
        .post(
            &format!("{}/mobilelogin/dologin", server.uri()),
            Some(&[("username", "archi"), ("password", "hunter2")]),
            None,
            Some(1),
        )
        .await
        .expect("login should end at the app scheme");

    assert_eq!(response.final_url.as_str(), "steammobile://start");
}

#[tokio::test]
async fn test_redirect_budget_through_public_api() {
    let server = MockServer::start().await;
    mount_redirects(&server, 5).await;
    let browser = browser();

    let response = browser
        .get_to_json::<ApiResponse>(&format!("{}/r/0", server.uri()), None, Some(1))
        .await
        .expect("5 hops fit the default budget");
    assert_eq!(response.content.success, 1);
    assert_eq!(
        response.final_url().as_str(),
        format!("{}/r/5", server.uri())
    );

    let strict = WebBrowser::new(WebBrowserConfig::default().with_max_redirects(4))
        .expect("Failed to create web browser");
    assert!(strict
        .get_to_string(&format!("{}/r/0", server.uri()), None, Some(1))
        .await
        .is_none());
}

#[tokio::test]
async fn test_download_identical_payload() {
    let server = MockServer::start().await;
    let payload: Vec<u8> = (0..65_537u32).map(|i| (i * 7 % 256) as u8).collect();
    Mock::given(method("GET"))
        .and(path("/update.zip"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(payload.clone()))
        .mount(&server)
        .await;

    let response = browser()
        .get_to_bytes(&format!("{}/update.zip", server.uri()), None, None)
        .await
        .expect("download should succeed");

    assert_eq!(response.content, payload);
}

#[tokio::test]
async fn test_concurrent_requests_share_browser() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<ok/>"))
        .expect(25)
        .mount(&server)
        .await;

    let browser = Arc::new(browser());
    let mut tasks = Vec::new();
    for i in 0..25 {
        let browser = Arc::clone(&browser);
        let url = format!("{}/item/{i}", server.uri());
        tasks.push(tokio::spawn(async move {
            browser.get_to_xml(&url, None, Some(1)).await.is_some()
        }));
    }

    for task in tasks {
        assert!(task.await.expect("task panicked"));
    }
}

#[tokio::test]
async fn test_exhaustion_returns_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    assert!(browser()
        .get_to_string(&server.uri(), None, Some(3))
        .await
        .is_none());
}
