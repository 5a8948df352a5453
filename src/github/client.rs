use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use axum::http::StatusCode;
use serde_json::Value;

/// Fixed coordinates of the backing repository.
pub mod repository {
    pub const OWNER: &str = "xaxkep";
    pub const NAME: &str = "DevLoop";
    pub const BRANCH: &str = "main";
    pub const RAW_CONTENT_BASE: &str = "https://raw.githubusercontent.com";
}

const USER_AGENT: &str = "DevLoop-App";
const ACCEPT: &str = "application/vnd.github.v3+json";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const ERROR_BODY_LIMIT: usize = 800;

/// Failure of a call against the GitHub REST API.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// GitHub answered with a non-success status.
    #[error("GitHub API error: {status} {body}")]
    Status { status: u16, body: String },
    /// The request never produced a response.
    #[error("Fetch error: {0}")]
    Transport(String),
    /// A success response whose body could not be decoded.
    #[error("Fetch error: invalid response body: {0}")]
    Decode(String),
}

impl UpstreamError {
    /// Status relayed to the caller: the upstream one, or 500 for local failures.
    pub fn status(&self) -> StatusCode {
        match self {
            UpstreamError::Status { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            UpstreamError::Transport(_) | UpstreamError::Decode(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// The subset of the GitHub API the handlers rely on.
///
/// Success bodies are returned as raw JSON so they can be relayed verbatim.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    async fn list_issues(&self) -> Result<Value, UpstreamError>;
    async fn get_issue(&self, number: u64) -> Result<Value, UpstreamError>;
    async fn create_issue(&self, payload: &Value) -> Result<Value, UpstreamError>;
    async fn update_issue(&self, number: u64, patch: &Value) -> Result<Value, UpstreamError>;
    /// Creates a file through the Contents API. `path` is relative to the repository root.
    async fn put_content(&self, path: &str, payload: &Value) -> Result<Value, UpstreamError>;
}

/// reqwest-backed [`IssueTracker`] bound to the backing repository.
#[derive(Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    api_base: String,
}

impl GitHubClient {
    /// `token` may be absent; requests are then sent unauthenticated.
    pub fn new(api_base: &str, token: Option<&str>) -> anyhow::Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static(USER_AGENT),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static(ACCEPT),
        );
        if let Some(token) = token {
            let mut value = reqwest::header::HeaderValue::from_str(&format!("token {}", token.trim()))
                .context("invalid github authorization header")?;
            value.set_sensitive(true);
            headers.insert(reqwest::header::AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    fn repo_url(&self, tail: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.api_base,
            repository::OWNER,
            repository::NAME,
            tail
        )
    }

    async fn send_json(
        &self,
        operation: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<Value, UpstreamError> {
        let response = request.send().await.map_err(|e| {
            tracing::warn!(operation, error = %e, "github request failed");
            UpstreamError::Transport(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body: truncate_for_error(&body, ERROR_BODY_LIMIT),
            });
        }

        tracing::debug!(operation, status = status.as_u16(), "github request succeeded");
        response
            .json::<Value>()
            .await
            .map_err(|e| UpstreamError::Decode(e.to_string()))
    }
}

#[async_trait]
impl IssueTracker for GitHubClient {
    async fn list_issues(&self) -> Result<Value, UpstreamError> {
        self.send_json("list issues", self.http.get(self.repo_url("issues")))
            .await
    }

    async fn get_issue(&self, number: u64) -> Result<Value, UpstreamError> {
        self.send_json(
            "get issue",
            self.http.get(self.repo_url(&format!("issues/{number}"))),
        )
        .await
    }

    async fn create_issue(&self, payload: &Value) -> Result<Value, UpstreamError> {
        self.send_json(
            "create issue",
            self.http.post(self.repo_url("issues")).json(payload),
        )
        .await
    }

    async fn update_issue(&self, number: u64, patch: &Value) -> Result<Value, UpstreamError> {
        self.send_json(
            "update issue",
            self.http
                .patch(self.repo_url(&format!("issues/{number}")))
                .json(patch),
        )
        .await
    }

    async fn put_content(&self, path: &str, payload: &Value) -> Result<Value, UpstreamError> {
        self.send_json(
            "put content",
            self.http
                .put(self.repo_url(&format!("contents/{path}")))
                .json(payload),
        )
        .await
    }
}

fn truncate_for_error(body: &str, limit: usize) -> String {
    match body.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}
