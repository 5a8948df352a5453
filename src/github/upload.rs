use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::ApiError;
use crate::github::client::{IssueTracker, repository};

pub const UPLOAD_DIR: &str = "images";
pub const COMMIT_MESSAGE: &str = "Upload screenshot";

/// Body of `POST /api/upload`. `content` is already base64-encoded.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadRequest {
    pub filename: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UploadResponse {
    pub url: String,
}

/// Rejects names that would escape the upload directory or change the
/// meaning of the URLs they are formatted into.
pub fn validate_filename(filename: &str) -> Result<&str, ApiError> {
    let trimmed = filename.trim();
    if trimmed.is_empty()
        || trimmed.contains('/')
        || trimmed.contains('\\')
        || trimmed.contains("..")
        || trimmed.contains(['?', '#'])
        || trimmed.chars().any(char::is_control)
    {
        return Err(ApiError::BadRequest(format!("Invalid filename: {filename}")));
    }
    Ok(trimmed)
}

/// Checks that `content` decodes as standard base64.
pub fn validate_content(content: &str) -> Result<(), ApiError> {
    STANDARD
        .decode(content.trim())
        .map(|_| ())
        .map_err(|e| ApiError::BadRequest(format!("Content is not valid base64: {e}")))
}

/// Public URL the file is served from once committed. Reachability is not checked.
pub fn raw_content_url(filename: &str) -> String {
    format!(
        "{}/{}/{}/{}/{UPLOAD_DIR}/{filename}",
        repository::RAW_CONTENT_BASE,
        repository::OWNER,
        repository::NAME,
        repository::BRANCH,
    )
}

/// Commits the file under `images/` and returns its raw URL.
///
/// No collision detection: re-uploading a name surfaces whatever GitHub
/// answers for a create without `sha`.
pub async fn upload_asset(
    tracker: &dyn IssueTracker,
    request: &UploadRequest,
) -> Result<UploadResponse, ApiError> {
    let filename = validate_filename(&request.filename)?;
    validate_content(&request.content)?;

    tracker
        .put_content(
            &format!("{UPLOAD_DIR}/{filename}"),
            &json!({ "message": COMMIT_MESSAGE, "content": request.content.trim() }),
        )
        .await?;

    Ok(UploadResponse {
        url: raw_content_url(filename),
    })
}
