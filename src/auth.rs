use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

/// Body of `POST /api/auth`
#[derive(Deserialize, Debug, Default)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Response to a credential check
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct LoginResponse {
    pub success: bool,
}

/// Configured admin credentials
pub struct AdminCredentials<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Outcome of comparing a login request with the admin credentials
#[derive(Debug, PartialEq)]
pub enum LoginResult {
    Granted,
    Denied,
}

/// Compares both fields in constant time.
///
/// Both comparisons always run, so timing does not reveal which field was
/// wrong.
pub fn check_credentials(request: &LoginRequest, admin: &AdminCredentials<'_>) -> LoginResult {
    let username_ok = request.username.as_bytes().ct_eq(admin.username.as_bytes());
    let password_ok = request.password.as_bytes().ct_eq(admin.password.as_bytes());
    if bool::from(username_ok & password_ok) {
        LoginResult::Granted
    } else {
        LoginResult::Denied
    }
}
