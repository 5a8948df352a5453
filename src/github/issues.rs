use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::ApiError;
use crate::github::body;
use crate::github::client::{IssueTracker, UpstreamError};

/// The fields of a GitHub issue this service reads back.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GitHubIssue {
    pub number: u64,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub labels: Vec<GitHubLabel>,
    pub state: IssueState,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GitHubLabel {
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    Open,
    Closed,
}

impl GitHubIssue {
    pub fn label_names(&self) -> Vec<String> {
        self.labels.iter().map(|label| label.name.clone()).collect()
    }

    pub fn body_text(&self) -> &str {
        self.body.as_deref().unwrap_or_default()
    }
}

/// Parses the `{id}` path segment into an issue number.
pub fn parse_issue_number(raw: &str) -> Result<u64, ApiError> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|number| *number > 0)
        .ok_or_else(|| ApiError::BadRequest(format!("Invalid issue id: {raw}")))
}

/// Fetches an issue and decodes the fields needed for label and body work.
pub async fn fetch_issue(
    tracker: &dyn IssueTracker,
    number: u64,
) -> Result<GitHubIssue, UpstreamError> {
    let raw = tracker.get_issue(number).await?;
    serde_json::from_value(raw).map_err(|e| UpstreamError::Decode(e.to_string()))
}

/// Creates an issue from a caller-supplied payload, stamping the caller's identity into the body.
///
/// Any field besides `title` and `body` is forwarded unchanged.
pub async fn create_issue(
    tracker: &dyn IssueTracker,
    payload: Value,
    identity: &str,
) -> Result<Value, ApiError> {
    let Value::Object(mut fields) = payload else {
        return Err(ApiError::BadRequest(
            "Issue payload must be a JSON object".to_string(),
        ));
    };
    if !fields.get("title").is_some_and(Value::is_string) {
        return Err(ApiError::BadRequest("Issue title is required".to_string()));
    }

    let stamped = body::append_identity(fields.get("body").and_then(Value::as_str), identity);
    fields.insert("body".to_string(), Value::String(stamped));

    Ok(tracker.create_issue(&Value::Object(fields)).await?)
}

/// Closes an issue. No check is made that it is currently open.
pub async fn close_issue(tracker: &dyn IssueTracker, number: u64) -> Result<Value, UpstreamError> {
    tracker
        .update_issue(number, &json!({ "state": IssueState::Closed }))
        .await
}
