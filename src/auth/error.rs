use anyhow::anyhow;
use serde::Deserialize;

use crate::error::FirebaseError;

#[derive(Debug, Deserialize)]
pub(crate) struct AuthApiError {
    error: AuthApiErrorInfo,
}

#[derive(Debug, Deserialize)]
struct AuthApiErrorInfo {
    message: String,
    code: u16,
}

impl AuthApiError {
    /// The error code without the human readable suffix the API sometimes
    /// appends, e.g. `TOO_MANY_ATTEMPTS_TRY_LATER : Access to this account...`.
    fn code(&self) -> &str {
        self.error
            .message
            .split_once(" : ")
            .map(|(code, _)| code)
            .unwrap_or(&self.error.message)
    }
}

impl From<AuthApiError> for FirebaseError {
    fn from(err: AuthApiError) -> Self {
        match err.code() {
            "EMAIL_EXISTS" => FirebaseError::EmailAlreadyExists,
            "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => {
                FirebaseError::InvalidCredentials
            }
            _ => anyhow!("Auth API error {}: {}", err.error.code, err.error.message).into(),
        }
    }
}
