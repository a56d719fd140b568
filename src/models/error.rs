//! Engine error taxonomy and the `{success, message, data?}` response envelope.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced by every engine operation. Never downgraded on the way out.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum EngineError {
    /// Malformed input: duplicate ids, too few entrants, winner not in match.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// Referenced bracket or match is missing.
    #[error("not found: {0}")]
    NotFound(String),
    /// Operation not valid in the current state.
    #[error("failed precondition: {0}")]
    FailedPrecondition(String),
    /// Denied by the authorization collaborator; the reason is passed through verbatim.
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    /// Persistence failure or transaction conflicts exhausted.
    #[error("internal error: {0}")]
    Internal(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Wire form of the error taxonomy.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidArgument,
    NotFound,
    FailedPrecondition,
    PermissionDenied,
    Internal,
}

impl EngineError {
    pub fn code(&self) -> ErrorCode {
        match self {
            EngineError::InvalidArgument(_) => ErrorCode::InvalidArgument,
            EngineError::NotFound(_) => ErrorCode::NotFound,
            EngineError::FailedPrecondition(_) => ErrorCode::FailedPrecondition,
            EngineError::PermissionDenied(_) => ErrorCode::PermissionDenied,
            EngineError::Internal(_) => ErrorCode::Internal,
        }
    }
}

/// Response shape of every public operation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorCode>,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            code: None,
        }
    }

    pub fn error(err: &EngineError) -> Self {
        Self {
            success: false,
            message: err.to_string(),
            data: None,
            code: Some(err.code()),
        }
    }

    pub fn from_result(result: EngineResult<T>, message: impl Into<String>) -> Self {
        match result {
            Ok(data) => Self::ok(message, data),
            Err(e) => Self::error(&e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_envelope_carries_code_and_no_data() {
        let r: ApiResponse<u32> = ApiResponse::from_result(
            Err(EngineError::NotFound("match 7".into())),
            "unused",
        );
        assert!(!r.success);
        assert_eq!(r.code, Some(ErrorCode::NotFound));
        assert_eq!(r.message, "not found: match 7");
        let json = serde_json::to_value(&r).unwrap();
        assert!(json.get("data").is_none());
        assert_eq!(json["code"], "not_found");
    }
}
