//! Endpoint discovery against a stand-in HTTP server.

use botreview_cdp::{CdpClient, CdpError, discover, fetch_pages};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_discover_reads_browser_version() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json/version"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "Browser": "Chrome/126.0.6478.126",
            "Protocol-Version": "1.3",
            "User-Agent": "Mozilla/5.0",
            "webSocketDebuggerUrl": "ws://127.0.0.1:9222/devtools/browser/abc"
        })))
        .mount(&server)
        .await;

    let version = discover(&format!("{}/", server.uri())).await.unwrap();
    assert_eq!(version.browser, "Chrome/126.0.6478.126");
    assert_eq!(
        version.web_socket_debugger_url,
        "ws://127.0.0.1:9222/devtools/browser/abc"
    );
}

#[tokio::test]
async fn test_connect_reports_unavailable_browser() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json/version"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = CdpClient::connect(&server.uri()).await.err().unwrap();
    assert!(matches!(err, CdpError::BrowserNotAvailable(_)));
    assert!(err.to_string().contains("--remote-debugging-port"));
}

#[tokio::test]
async fn test_discover_rejects_malformed_version() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json/version"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    assert!(matches!(
        discover(&server.uri()).await,
        Err(CdpError::BrowserNotAvailable(_))
    ));
}

#[tokio::test]
async fn test_fetch_pages_keeps_only_tabs() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"id": "A", "type": "page", "title": "Bump serde", "url": "https://github.com/acme/widgets/pull/7"},
            {"id": "B", "type": "service_worker", "url": "https://github.com/sw.js"},
            {"id": "C", "type": "page", "title": "GitHub", "url": "https://github.com/"}
        ])))
        .mount(&server)
        .await;

    let pages = fetch_pages(&server.uri()).await.unwrap();
    let ids: Vec<_> = pages.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["A", "C"]);
}

#[tokio::test]
async fn test_fetch_pages_surfaces_http_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json/list"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    assert!(matches!(
        fetch_pages(&server.uri()).await,
        Err(CdpError::Http(_))
    ));
}
