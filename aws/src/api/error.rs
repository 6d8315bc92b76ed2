use thiserror::Error;

/// Error code Cognito returns for a group or pool that does not exist
pub const RESOURCE_NOT_FOUND: &str = "ResourceNotFoundException";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("{code}: {message} (HTTP {status})")]
    Service {
        status: u16,
        code: String,
        message: String,
    },

    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

impl ApiError {
    /// Service error code such as "InvalidParameterException"
    pub fn code(&self) -> Option<&str> {
        match self {
            ApiError::Service { code, .. } => Some(code),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.code() == Some(RESOURCE_NOT_FOUND)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::Service {
            status: 400,
            code: RESOURCE_NOT_FOUND.to_string(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_classified_by_code() {
        let err = ApiError::not_found("Group not found.");
        assert!(err.is_not_found());
        assert_eq!(
            err.to_string(),
            "ResourceNotFoundException: Group not found. (HTTP 400)"
        );

        let err = ApiError::Service {
            status: 400,
            code: "InvalidParameterException".to_string(),
            message: "bad".to_string(),
        };
        assert!(!err.is_not_found());
        assert!(!ApiError::ParseError("x".to_string()).is_not_found());
    }
}
