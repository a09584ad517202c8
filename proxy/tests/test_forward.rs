//! Edge router forwarding tests
//!
//! The proxy router is driven in process while a fake artifact store
//! listens on an ephemeral port, so the full rewrite-forward-propagate path
//! is exercised end to end.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use http_body_util::BodyExt;
use tokio::net::TcpListener;
use tower::util::ServiceExt;

use skiff_proxy::server::{build_router, ProxyState};

/// Serve a minimal store: one deployment `foo` with two objects. `app.js`
/// deliberately omits its content type to exercise the proxy's fallback.
async fn start_fake_store() -> String {
    let app = Router::new()
        .route(
            "/skiff/__outputs/foo/index.html",
            get(|| async { ([(header::CONTENT_TYPE, "text/html")], "<html>foo</html>").into_response() }),
        )
        .route(
            "/skiff/__outputs/foo/app.js",
            get(|| async {
                // Genuinely omit the content type: axum's string IntoResponse
                // otherwise auto-sets text/plain, which would defeat the
                // proxy fallback this test exercises.
                let mut response = "console.log('foo')".into_response();
                response.headers_mut().remove(header::CONTENT_TYPE);
                response
            }),
        )
        .fallback(|| async { (StatusCode::NOT_FOUND, "no such object").into_response() });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}/skiff", addr)
}

fn proxy_router(store_base_url: String) -> Router {
    let state = Arc::new(ProxyState {
        client: reqwest::Client::new(),
        store_base_url,
    });
    build_router(state)
}

async fn proxy_get(app: Router, host: &str, path: &str) -> (StatusCode, axum::http::HeaderMap, String) {
    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(path)
                .header(header::HOST, host)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, headers, String::from_utf8_lossy(&bytes).into_owned())
}

#[tokio::test]
async fn test_root_serves_the_deployments_default_document() {
    let store = start_fake_store().await;
    let app = proxy_router(store);

    let (status, headers, body) = proxy_get(app, "foo.skiff.local", "/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "<html>foo</html>");
    assert_eq!(headers.get(header::CONTENT_TYPE).unwrap(), "text/html");
    assert_eq!(headers.get("x-served-by").unwrap(), "skiff-proxy");
}

#[tokio::test]
async fn test_asset_content_type_falls_back_to_extension() {
    let store = start_fake_store().await;
    let app = proxy_router(store);

    let (status, headers, body) = proxy_get(app, "foo.skiff.local:8000", "/app.js").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("console.log"));
    let content_type = headers.get(header::CONTENT_TYPE).unwrap().to_str().unwrap();
    assert!(content_type.contains("javascript"));
}

#[tokio::test]
async fn test_unknown_deployment_surfaces_the_stores_not_found() {
    let store = start_fake_store().await;
    let app = proxy_router(store);

    let (status, _headers, body) = proxy_get(app, "unknown.skiff.local", "/").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "no such object");
}

#[tokio::test]
async fn test_unreachable_store_is_a_gateway_error() {
    // Bind then immediately drop a listener so the port is dead
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let app = proxy_router(format!("http://{}/skiff", addr));
    let (status, _headers, _body) = proxy_get(app, "foo.skiff.local", "/").await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
}
