use crate::transport::TransportError;
use serde_json::Value;
use thiserror::Error;

/// Main error type for Sellsy API calls
#[derive(Debug, Error)]
pub enum SellsyError {
    /// Network or HTTP-level failure below the API envelope
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The service rejected the OAuth signature
    #[error("authentication rejected: {body}")]
    Authentication { body: String },

    /// The response body is not a usable envelope
    #[error("malformed response ({reason}): {body}")]
    MalformedResponse { reason: String, body: String },

    /// Error reported by the API with a structured code
    #[error("API error {code}: {message}")]
    Api {
        message: String,
        code: Value,
        more: Option<Value>,
    },

    /// The API reported a failure without a usable error object
    #[error("unknown API error")]
    UnknownApi,

    /// The asynchronous call was cancelled before it settled
    #[error("call cancelled")]
    Cancelled,

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SellsyError {
    /// Create a malformed response error
    pub fn malformed(reason: impl Into<String>, body: impl Into<String>) -> Self {
        SellsyError::MalformedResponse {
            reason: reason.into(),
            body: body.into(),
        }
    }

    /// Check if the service refused our credentials
    pub fn is_auth_error(&self) -> bool {
        matches!(self, SellsyError::Authentication { .. })
    }

    /// Check if the failure happened below the API envelope
    pub fn is_transport(&self) -> bool {
        matches!(self, SellsyError::Transport(_))
    }

    /// Get the API error code if this is an API error
    pub fn api_code(&self) -> Option<&Value> {
        match self {
            SellsyError::Api { code, .. } => Some(code),
            _ => None,
        }
    }
}

/// Result type for Sellsy operations
pub type Result<T> = std::result::Result<T, SellsyError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_api_error_display() {
        let error = SellsyError::Api {
            message: "bad".to_string(),
            code: json!(42),
            more: None,
        };
        assert_eq!(error.to_string(), "API error 42: bad");
        assert_eq!(error.api_code(), Some(&json!(42)));
        assert!(!error.is_auth_error());
    }

    #[test]
    fn test_auth_error() {
        let error = SellsyError::Authentication {
            body: "oauth_problem=token_rejected".to_string(),
        };
        assert!(error.is_auth_error());
        assert!(error.api_code().is_none());
    }

    #[test]
    fn test_transport_conversion() {
        let error: SellsyError = TransportError::status(502, "bad gateway").into();
        assert!(error.is_transport());
        assert!(error.to_string().contains("502"));
    }
}
