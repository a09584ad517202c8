//! Transparent forwarding to the artifact store

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::response::{IntoResponse, Response};
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE, HOST};
use http::{HeaderMap, StatusCode};
use tracing::{debug, error};

use crate::routing::{deployment_id_from_host, fallback_content_type, rewrite_path, upstream_url};
use crate::server::ProxyState;

/// Fixed response header identifying the proxy
pub const SERVED_BY_HEADER: &str = "x-served-by";
pub const SERVED_BY_VALUE: &str = "skiff-proxy";

/// Hop-by-hop headers never forwarded in either direction
const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailers",
    "transfer-encoding",
    "upgrade",
];

fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(&name.as_str())
}

/// Proxy one request to the corresponding store object. Method and headers
/// are preserved; the store's status and body pass through unmodified.
pub async fn forward_handler(State(state): State<Arc<ProxyState>>, request: Request) -> Response {
    let host = request
        .headers()
        .get(HOST)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");

    let Some(deployment_id) = deployment_id_from_host(host) else {
        return (StatusCode::BAD_REQUEST, "missing or invalid host header").into_response();
    };

    let path = rewrite_path(request.uri().path()).to_string();
    let url = upstream_url(&state.store_base_url, &deployment_id, &path);
    debug!("{} {}{} -> {}", request.method(), host, request.uri().path(), url);

    let (parts, body) = request.into_parts();

    let mut upstream = state.client.request(parts.method, &url);
    for (name, value) in &parts.headers {
        // The store gets its own Host from the URL
        if name == HOST || is_hop_by_hop(name) {
            continue;
        }
        upstream = upstream.header(name, value);
    }
    upstream = upstream.body(reqwest::Body::wrap_stream(body.into_data_stream()));

    let response = match upstream.send().await {
        Ok(response) => response,
        Err(e) => {
            error!("Artifact store unreachable: {}", e);
            return (StatusCode::BAD_GATEWAY, "artifact store unreachable").into_response();
        }
    };

    let status = response.status();
    let mut headers = HeaderMap::new();
    for (name, value) in response.headers() {
        if is_hop_by_hop(name) {
            continue;
        }
        headers.insert(name.clone(), value.clone());
    }

    if !headers.contains_key(CONTENT_TYPE) {
        if let Ok(value) = HeaderValue::from_str(&fallback_content_type(&path)) {
            headers.insert(CONTENT_TYPE, value);
        }
    }
    headers.insert(
        HeaderName::from_static(SERVED_BY_HEADER),
        HeaderValue::from_static(SERVED_BY_VALUE),
    );

    let mut out = Response::new(Body::from_stream(response.bytes_stream()));
    *out.status_mut() = status;
    *out.headers_mut() = headers;
    out
}
