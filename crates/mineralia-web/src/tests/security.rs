use axum::http::StatusCode;

use super::harness::{TestHarness, header_value};

#[tokio::test]
async fn responses_include_security_headers() {
    let harness = TestHarness::setup();
    for path in ["/api/health", "/api/minerals", "/api/minerals/not-a-uuid"] {
        let response = harness.get(path).await;
        assert_eq!(
            header_value(response.headers(), "x-content-type-options"),
            Some("nosniff"),
            "{path}"
        );
        assert_eq!(
            header_value(response.headers(), "x-frame-options"),
            Some("DENY"),
            "{path}"
        );
        assert_eq!(
            header_value(response.headers(), "referrer-policy"),
            Some("no-referrer"),
            "{path}"
        );
        let csp = header_value(response.headers(), "content-security-policy").expect("csp header");
        assert!(csp.contains("default-src 'none'"));
    }
}

#[tokio::test]
async fn unknown_routes_are_not_found() {
    let harness = TestHarness::setup();
    let response = harness.get("/api/unknown").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        header_value(response.headers(), "x-frame-options"),
        Some("DENY")
    );
}
