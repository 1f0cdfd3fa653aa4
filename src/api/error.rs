//! API error type and its wire form.

use serde::Serialize;

use crate::error::Error;

/// An error answered to an API caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The request carried an invalid parameter.
    BadRequest(String),

    /// Something is wrong inside the daemon, not with the request.
    InternalError(String),
}

impl ApiError {
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::InternalError(_) => 500,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) | ApiError::InternalError(msg) => msg,
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            kind: "error",
            status_code: self.status_code(),
            status: match self {
                ApiError::BadRequest(_) => "Bad Request",
                ApiError::InternalError(_) => "Internal Server Error",
            },
            result: ErrorResult {
                message: self.message().to_string(),
            },
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message(), self.status_code())
    }
}

impl std::error::Error for ApiError {}

/// Validation failures are the caller's fault; everything else is ours.
impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        if err.is_validation() {
            ApiError::BadRequest(err.to_string())
        } else {
            ApiError::InternalError(err.to_string())
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ErrorResponse {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub status_code: u16,
    pub status: &'static str,
    pub result: ErrorResult,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorResult {
    pub message: String,
}
