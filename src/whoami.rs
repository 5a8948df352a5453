use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};

/// Header injected by the access-control proxy in front of the service.
pub const IDENTITY_HEADER: &str = "cf-access-authenticated-user-email";
/// Identity used when the request did not pass through the access proxy.
pub const FALLBACK_IDENTITY: &str = "dev-mode@localhost";

/// Body of `GET /api/auth`.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct WhoamiResponse {
    pub email: String,
}

/// Returns the caller's email from the trusted identity header.
///
/// The header is not validated here; the access proxy is the trust boundary.
/// Non-UTF-8 bytes are replaced rather than rejected. An absent or blank
/// header yields [`FALLBACK_IDENTITY`].
pub fn resolve_identity(headers: &HeaderMap) -> String {
    headers
        .get(IDENTITY_HEADER)
        .map(|value| String::from_utf8_lossy(value.as_bytes()).trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| FALLBACK_IDENTITY.to_string())
}
