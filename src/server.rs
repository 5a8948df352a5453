//! HTTP surface: one axum route per resource, thin handlers over the
//! `github` operations.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use chrono::Utc;
use serde_json::Value;
use tower_http::trace::TraceLayer;

use crate::auth::{self, AdminCredentials, LoginRequest, LoginResponse, LoginResult};
use crate::config::{Config, ConfigKey};
use crate::error::ApiError;
use crate::github::body::ReplacementRequest;
use crate::github::client::IssueTracker;
use crate::github::issues;
use crate::github::labels::{self, FieldUpdate};
use crate::github::replace::{self, REPLACE_OUTCOME_HEADER};
use crate::github::upload::{self, UploadRequest, UploadResponse};
use crate::whoami::{self, WhoamiResponse};

/// Read-only state shared by all handlers.
pub struct AppState {
    pub config: Config,
    pub tracker: Arc<dyn IssueTracker>,
}

impl AppState {
    pub fn new(config: Config, tracker: Arc<dyn IssueTracker>) -> Self {
        Self { config, tracker }
    }

    /// The tracker, provided a GitHub token is configured.
    fn tracker(&self) -> Result<&dyn IssueTracker, ApiError> {
        self.config.require(ConfigKey::GithubToken)?;
        Ok(self.tracker.as_ref())
    }
}

pub type SharedState = Arc<AppState>;

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route(
            "/api/auth",
            get(get_identity)
                .post(login)
                .head(method_not_allowed)
                .fallback(method_not_allowed),
        )
        .route(
            "/api/issues",
            get(list_issues)
                .post(create_issue)
                .head(method_not_allowed)
                .fallback(method_not_allowed),
        )
        .route(
            "/api/issues/{id}",
            patch(update_issue)
                .delete(close_issue)
                .put(replace_issue)
                .fallback(method_not_allowed),
        )
        .route(
            "/api/upload",
            post(upload_asset).fallback(method_not_allowed),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn method_not_allowed() -> (StatusCode, &'static str) {
    (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}

async fn get_identity(headers: HeaderMap) -> Json<WhoamiResponse> {
    Json(WhoamiResponse {
        email: whoami::resolve_identity(&headers),
    })
}

async fn login(
    State(state): State<SharedState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let admin = AdminCredentials {
        username: state.config.require(ConfigKey::AdminUsername)?,
        password: state.config.require(ConfigKey::AdminPassword)?,
    };
    match auth::check_credentials(&request, &admin) {
        LoginResult::Granted => Ok(Json(LoginResponse { success: true })),
        LoginResult::Denied => {
            tracing::info!(username = %request.username, "admin login rejected");
            Err(ApiError::Unauthorized)
        }
    }
}

async fn list_issues(State(state): State<SharedState>) -> Result<Json<Value>, ApiError> {
    let tracker = state.tracker()?;
    Ok(Json(tracker.list_issues().await?))
}

async fn create_issue(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let tracker = state.tracker()?;
    let identity = whoami::resolve_identity(&headers);
    Ok(Json(issues::create_issue(tracker, payload, &identity).await?))
}

async fn update_issue(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(update): Json<FieldUpdate>,
) -> Result<Json<Value>, ApiError> {
    let tracker = state.tracker()?;
    let number = issues::parse_issue_number(&id)?;
    Ok(Json(labels::update_field(tracker, number, &update).await?))
}

async fn close_issue(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let tracker = state.tracker()?;
    let number = issues::parse_issue_number(&id)?;
    Ok(Json(issues::close_issue(tracker, number).await?))
}

async fn replace_issue(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(request): Json<ReplacementRequest>,
) -> Result<Response, ApiError> {
    let tracker = state.tracker()?;
    let number = issues::parse_issue_number(&id)?;
    let replacement = replace::replace_issue(tracker, number, &request, Utc::now()).await?;
    Ok((
        [(REPLACE_OUTCOME_HEADER, replacement.outcome.as_str())],
        Json(replacement.issue),
    )
        .into_response())
}

async fn upload_asset(
    State(state): State<SharedState>,
    Json(request): Json<UploadRequest>,
) -> Result<Json<UploadResponse>, ApiError> {
    let tracker = state.tracker()?;
    Ok(Json(upload::upload_asset(tracker, &request).await?))
}
