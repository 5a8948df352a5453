//! Metadata embedded in issue bodies as `Key: value` lines.
//!
//! GitHub issues have no custom fields, so reporter name, email and creation
//! time travel inside the body text. All reading and writing of those lines
//! goes through this module.

use std::sync::LazyLock;

use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use serde::Deserialize;

pub const NAME_KEY: &str = "Name";
pub const EMAIL_KEY: &str = "Email";
pub const CREATED_AT_KEY: &str = "Created At";
pub const DESCRIPTION_PLACEHOLDER: &str = "No description provided.";

static NAME_LINE: LazyLock<Regex> = LazyLock::new(|| metadata_line(NAME_KEY));
static EMAIL_LINE: LazyLock<Regex> = LazyLock::new(|| metadata_line(EMAIL_KEY));
static CREATED_AT_LINE: LazyLock<Regex> = LazyLock::new(|| metadata_line(CREATED_AT_KEY));

fn metadata_line(key: &str) -> Regex {
    Regex::new(&format!(r"(?m)^[ \t]*{}:[ \t]*(.*?)[ \t\r]*$", regex::escape(key)))
        .unwrap_or_else(|e| panic!("metadata pattern for {key} is invalid: {e}"))
}

/// Structured view of the metadata lines found in an issue body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IssueMetadata {
    pub name: Option<String>,
    pub email: Option<String>,
    pub created_at: Option<String>,
}

impl IssueMetadata {
    /// Reads the first occurrence of each key. Keys with an empty value are absent.
    pub fn extract(body: &str) -> Self {
        let capture = |pattern: &Regex| {
            pattern
                .captures(body)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string())
                .filter(|value| !value.is_empty())
        };
        IssueMetadata {
            name: capture(&NAME_LINE),
            email: capture(&EMAIL_LINE),
            created_at: capture(&CREATED_AT_LINE),
        }
    }
}

/// Body of `PUT /api/issues/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReplacementRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub screenshots: Vec<String>,
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// Appends an `Email:` line for `identity`, separated from any existing text by a blank line.
pub fn append_identity(body: Option<&str>, identity: &str) -> String {
    let line = format!("{EMAIL_KEY}: {identity}");
    match body.map(str::trim_end).filter(|text| !text.is_empty()) {
        Some(text) => format!("{text}\n\n{line}"),
        None => line,
    }
}

/// Builds the body of a replacement issue.
///
/// Blocks are separated by blank lines: description, URL, screenshots,
/// then the metadata. `Created At` keeps the preserved value and falls back
/// to `now`.
pub fn compose_replacement_body(
    request: &ReplacementRequest,
    preserved: &IssueMetadata,
    now: DateTime<Utc>,
) -> String {
    let mut blocks = vec![
        present(request.description.as_deref())
            .unwrap_or(DESCRIPTION_PLACEHOLDER)
            .to_string(),
    ];

    if let Some(url) = present(request.url.as_deref()) {
        blocks.push(format!("URL: {url}"));
    }

    let screenshots: Vec<&str> = request
        .screenshots
        .iter()
        .filter_map(|shot| present(Some(shot.as_str())))
        .collect();
    if !screenshots.is_empty() {
        blocks.push(format!("Screenshots:\n{}", screenshots.join("\n")));
    }

    let created_at = preserved
        .created_at
        .clone()
        .unwrap_or_else(|| now.to_rfc3339_opts(SecondsFormat::Secs, true));
    let mut metadata = vec![format!("{CREATED_AT_KEY}: {created_at}")];
    if let Some(name) = &preserved.name {
        metadata.push(format!("{NAME_KEY}: {name}"));
    }
    if let Some(email) = &preserved.email {
        metadata.push(format!("{EMAIL_KEY}: {email}"));
    }
    blocks.push(metadata.join("\n"));

    blocks.join("\n\n")
}

/// The original body with a pointer to the issue that superseded it.
pub fn replaced_by_note(original_body: &str, replacement_number: u64) -> String {
    let note = format!("---\nThis issue was replaced by #{replacement_number}");
    match original_body.trim_end() {
        "" => note,
        text => format!("{text}\n\n{note}"),
    }
}
