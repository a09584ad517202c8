//! Hostname-based deployment resolution
//!
//! The leftmost hostname label names the deployment. Existence is never
//! checked here; an unknown deployment simply surfaces the store's
//! not-found response. Policy checks, if ever added, belong in a separate
//! layer, not in this path rewrite.

use std::path::Path;

use skiff_platform::store::OUTPUT_PREFIX;
use skiff_platform::util::content_type_for;

/// Extract the deployment id from a Host header value
pub fn deployment_id_from_host(host: &str) -> Option<String> {
    let hostname = host.split(':').next().unwrap_or(host);
    let label = hostname.split('.').next().unwrap_or("");
    if label.is_empty() {
        None
    } else {
        Some(label.to_string())
    }
}

/// Default-document rewrite: `/` resolves to `/index.html`, one level only
pub fn rewrite_path(path: &str) -> &str {
    if path == "/" {
        "/index.html"
    } else {
        path
    }
}

/// Upstream store URL for one rewritten request path
pub fn upstream_url(store_base: &str, deployment_id: &str, path: &str) -> String {
    format!(
        "{}/{}/{}{}",
        store_base.trim_end_matches('/'),
        OUTPUT_PREFIX,
        deployment_id,
        path
    )
}

/// Content type inferred from the request path, used when the store
/// response carries none
pub fn fallback_content_type(path: &str) -> String {
    content_type_for(Path::new(path))
}
