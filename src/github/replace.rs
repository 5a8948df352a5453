use chrono::{DateTime, Utc};
use serde_json::{Value, json};

use crate::github::body::{self, IssueMetadata, ReplacementRequest};
use crate::github::client::{IssueTracker, UpstreamError};
use crate::github::issues::{self, GitHubIssue, IssueState};

/// Response header carrying [`ReplaceOutcome`] to HTTP callers.
pub const REPLACE_OUTCOME_HEADER: &str = "x-devloop-replace-outcome";

/// How far a replacement got once its successor issue exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceOutcome {
    /// Successor created and original closed.
    Replaced,
    /// Successor created, but the original is still open.
    ReplacedButCloseFailed,
}

impl ReplaceOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReplaceOutcome::Replaced => "replaced",
            ReplaceOutcome::ReplacedButCloseFailed => "replaced-but-close-failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Replacement {
    /// The successor issue as GitHub returned it.
    pub issue: Value,
    pub outcome: ReplaceOutcome,
}

/// Payload for the successor issue: new title and body, labels carried over verbatim.
pub fn successor_payload(
    current: &GitHubIssue,
    request: &ReplacementRequest,
    now: DateTime<Utc>,
) -> Value {
    let preserved = IssueMetadata::extract(current.body_text());
    json!({
        "title": request.title,
        "body": body::compose_replacement_body(request, &preserved, now),
        "labels": current.label_names(),
    })
}

/// Payload closing the original issue with a back-reference to its successor.
pub fn retirement_payload(current: &GitHubIssue, successor_number: u64) -> Value {
    json!({
        "state": IssueState::Closed,
        "body": body::replaced_by_note(current.body_text(), successor_number),
    })
}

/// Replaces issue `number` with a new issue, then closes the original.
///
/// Failing to fetch the original or to create the successor aborts with the
/// original untouched. Failing to close the original does not discard the
/// successor; it is reported as [`ReplaceOutcome::ReplacedButCloseFailed`].
pub async fn replace_issue(
    tracker: &dyn IssueTracker,
    number: u64,
    request: &ReplacementRequest,
    now: DateTime<Utc>,
) -> Result<Replacement, UpstreamError> {
    let current = issues::fetch_issue(tracker, number).await?;
    let created = tracker
        .create_issue(&successor_payload(&current, request, now))
        .await?;

    let Some(successor) = created["number"].as_u64() else {
        tracing::error!(
            issue = number,
            "successor issue has no number; original left open"
        );
        return Ok(Replacement {
            issue: created,
            outcome: ReplaceOutcome::ReplacedButCloseFailed,
        });
    };

    let outcome = match tracker
        .update_issue(number, &retirement_payload(&current, successor))
        .await
    {
        Ok(_) => {
            tracing::info!(issue = number, successor, "issue replaced");
            ReplaceOutcome::Replaced
        }
        Err(e) => {
            tracing::error!(
                issue = number,
                successor,
                error = %e,
                "failed to close replaced issue"
            );
            ReplaceOutcome::ReplacedButCloseFailed
        }
    };

    Ok(Replacement {
        issue: created,
        outcome,
    })
}
