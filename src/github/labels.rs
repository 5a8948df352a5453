//! Category labels: three mutually exclusive label fields kept on each issue.
//!
//! Updates follow a reconcile-not-merge policy. Every label a field
//! recognizes is removed before the new value, if any, is added.

use serde::Deserialize;
use serde_json::{Value, json};

use crate::github::client::{IssueTracker, UpstreamError};
use crate::github::issues;

pub const STATUS_PREFIX: &str = "status:";
pub const FEASIBILITY_VALUES: &[&str] = &["high", "medium", "low"];
pub const EFFORT_VALUES: &[&str] = &["easy", "medium", "hard"];
/// Value that clears feasibility or effort without adding a label.
pub const UNASSESSED: &str = "Unassessed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelField {
    Status,
    Feasibility,
    Effort,
}

impl LabelField {
    pub fn parse(field: &str) -> Option<Self> {
        match field {
            "status" => Some(LabelField::Status),
            "feasibility" => Some(LabelField::Feasibility),
            "effort" => Some(LabelField::Effort),
            _ => None,
        }
    }

    /// Whether `label` is one of this field's values.
    pub fn recognizes(&self, label: &str) -> bool {
        match self {
            LabelField::Status => label.starts_with(STATUS_PREFIX),
            LabelField::Feasibility => FEASIBILITY_VALUES.contains(&label),
            LabelField::Effort => EFFORT_VALUES.contains(&label),
        }
    }

    /// Label representing `value`, or `None` when the value clears the field.
    ///
    /// Values outside the known sets are not rejected; they only get case
    /// (and, for status, space) normalization.
    pub fn label_for(&self, value: &str) -> Option<String> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        match self {
            LabelField::Status => Some(format!(
                "{STATUS_PREFIX}{}",
                value.to_lowercase().replace(' ', "-")
            )),
            LabelField::Feasibility | LabelField::Effort if value == UNASSESSED => None,
            LabelField::Feasibility | LabelField::Effort => Some(value.to_lowercase()),
        }
    }
}

/// Body of `PATCH /api/issues/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldUpdate {
    pub field: String,
    #[serde(default)]
    pub value: Option<String>,
}

/// Returns the label set after setting `field` to `value`.
///
/// Labels outside the field keep their order. The new label goes last and
/// is never duplicated, so applying the same update twice gives the same set.
pub fn reconcile_labels(labels: &[String], field: LabelField, value: Option<&str>) -> Vec<String> {
    let mut reconciled: Vec<String> = labels
        .iter()
        .filter(|label| !field.recognizes(label))
        .cloned()
        .collect();
    if let Some(label) = value.and_then(|value| field.label_for(value)) {
        if !reconciled.contains(&label) {
            reconciled.push(label);
        }
    }
    reconciled
}

/// Applies `update` to the live label set of issue `number` and writes the whole set back.
///
/// An unrecognized field leaves the labels as they are, but they are still
/// written back.
pub async fn update_field(
    tracker: &dyn IssueTracker,
    number: u64,
    update: &FieldUpdate,
) -> Result<Value, UpstreamError> {
    let issue = issues::fetch_issue(tracker, number).await?;
    let current = issue.label_names();

    let labels = match LabelField::parse(&update.field) {
        Some(field) => reconcile_labels(&current, field, update.value.as_deref()),
        None => {
            tracing::warn!(
                issue = number,
                field = %update.field,
                "unrecognized label field; labels left unchanged"
            );
            current
        }
    };

    tracker
        .update_issue(number, &json!({ "labels": labels }))
        .await
}
