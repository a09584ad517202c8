//! HTTP request handlers

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use skiff_platform::models::{Deployment, LaunchSpec};
use skiff_platform::util::{generate_slug, version_info};

use crate::server::state::ServerState;

/// Deployment request body
#[derive(Debug, Deserialize)]
pub struct NewDeploymentRequest {
    /// Repository to deploy
    #[serde(rename = "gitURL")]
    pub git_url: Option<String>,

    /// Optional explicit deployment name, used verbatim when present
    pub name: Option<String>,
}

/// Deployment response body
#[derive(Debug, Serialize)]
pub struct NewDeploymentResponse {
    pub status: String,
    pub data: NewDeploymentData,
}

#[derive(Debug, Serialize)]
pub struct NewDeploymentData {
    pub url: String,
    pub name: String,
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
}

/// Deployment intake handler. Returns as soon as the launcher has accepted
/// the request; build completion is only observable through the log stream.
pub async fn new_deployment_handler(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<NewDeploymentRequest>,
) -> Result<Json<NewDeploymentResponse>, (StatusCode, Json<ErrorResponse>)> {
    let git_url = match request.git_url.filter(|url| !url.is_empty()) {
        Some(url) => url,
        None => {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    message: "git url is required".to_string(),
                }),
            ));
        }
    };

    // Generated slugs are unique with overwhelming probability and are not
    // checked for collisions
    let slug = request
        .name
        .filter(|name| !name.is_empty())
        .unwrap_or_else(generate_slug);
    let deployment = Deployment::new(slug, git_url, &state.dispatch.base_domain);

    info!("Dispatching deployment {} ({})", deployment.id, deployment.git_url);

    let spec = LaunchSpec {
        deployment_id: deployment.id.clone(),
        git_url: deployment.git_url.clone(),
    };

    if let Err(e) = state.launcher.launch(&spec).await {
        error!("Failed to launch build worker for {}: {}", deployment.id, e);
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                message: format!("failed to launch build worker: {}", e),
            }),
        ));
    }

    Ok(Json(NewDeploymentResponse {
        status: "queued".to_string(),
        data: NewDeploymentData {
            url: deployment.serving_url(&state.dispatch.public_scheme),
            name: deployment.id,
        },
    }))
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

/// Health check handler
pub async fn health_handler() -> impl IntoResponse {
    let version = version_info();
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "skiff-api".to_string(),
        version: version.version,
    })
}

/// Version response
#[derive(Debug, Serialize)]
pub struct VersionResponse {
    pub version: String,
    pub git_hash: String,
    pub build_time: String,
}

/// Version handler
pub async fn version_handler() -> impl IntoResponse {
    let version = version_info();
    Json(VersionResponse {
        version: version.version,
        git_hash: version.git_hash,
        build_time: version.build_time,
    })
}
