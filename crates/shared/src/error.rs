use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error body returned by the crypto service.
///
/// The service is not consistent about the shape: operation routes answer
/// `{ "error": ... }` (sometimes with `"success": false`), the authentication
/// route answers `{ "success": false, "message": ... }`. Every field is
/// therefore optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiError {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ApiError {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            message: None,
        }
    }

    pub fn reason(&self) -> String {
        self.error
            .clone()
            .or_else(|| self.message.clone())
            .unwrap_or_else(|| "service reported failure without a reason".to_string())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct RemoteRejection {
    pub message: String,
}

impl RemoteRejection {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<ApiError> for RemoteRejection {
    fn from(value: ApiError) -> Self {
        Self {
            message: value.reason(),
        }
    }
}
