//! Error types for registry operations.

use thiserror::Error;

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors that can occur in registry operations
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A register request was missing or carried malformed required fields
    #[error("Invalid registration: {reason}")]
    InvalidRegistration { reason: String },

    /// An operation referenced an unknown agent name
    #[error("Agent not found: {name}")]
    AgentNotFound { name: String },

    /// The registry could not be reached
    #[error("Connection error: {message}")]
    ConnectionError { message: String },

    /// A request did not complete within the configured timeout
    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// The registry answered with something outside the wire contract
    #[error("Unexpected response: {message}")]
    UnexpectedResponse { message: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// URL parsing error
    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    /// HTTP transport error (when client feature is enabled)
    #[cfg(feature = "client")]
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// The server could not bind its configured address
    #[error("Failed to bind {addr}: {message}")]
    BindError { addr: String, message: String },

    /// Internal error
    #[error("Internal error: {message}")]
    InternalError { message: String },
}

impl RegistryError {
    /// Create an invalid registration error
    pub fn invalid_registration(reason: impl Into<String>) -> Self {
        Self::InvalidRegistration {
            reason: reason.into(),
        }
    }

    /// Create an agent not found error
    pub fn agent_not_found(name: impl Into<String>) -> Self {
        Self::AgentNotFound { name: name.into() }
    }

    /// Create a connection error
    pub fn connection_error(message: impl Into<String>) -> Self {
        Self::ConnectionError {
            message: message.into(),
        }
    }

    /// Create an unexpected response error
    pub fn unexpected_response(message: impl Into<String>) -> Self {
        Self::UnexpectedResponse {
            message: message.into(),
        }
    }

    /// Create a bind error
    pub fn bind_error(addr: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BindError {
            addr: addr.into(),
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }

    /// Check if this error is worth retrying.
    ///
    /// The client itself never retries; this is a hook for callers that
    /// bring their own retry loop.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RegistryError::ConnectionError { .. } | RegistryError::Timeout { .. }
        )
    }
}

/// Error body returned by the registry server
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ErrorResponse {
    /// HTTP-style error code
    pub code: u16,
    /// Error message
    pub message: String,
}

impl ErrorResponse {
    /// Create a new error response
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl From<RegistryError> for ErrorResponse {
    fn from(err: RegistryError) -> Self {
        let code = match &err {
            RegistryError::InvalidRegistration { .. } => 400,
            RegistryError::AgentNotFound { .. } => 404,
            RegistryError::SerializationError(_) => 400,
            RegistryError::UrlError(_) => 400,
            RegistryError::UnexpectedResponse { .. } => 502,
            RegistryError::ConnectionError { .. } => 502,
            RegistryError::Timeout { .. } => 504,
            #[cfg(feature = "client")]
            RegistryError::HttpError(_) => 502,
            RegistryError::BindError { .. } => 500,
            RegistryError::InternalError { .. } => 500,
        };

        ErrorResponse::new(code, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = RegistryError::agent_not_found("weather_agent");
        assert!(matches!(err, RegistryError::AgentNotFound { .. }));
        assert_eq!(err.to_string(), "Agent not found: weather_agent");
    }

    #[test]
    fn test_error_retryable() {
        let connection_err = RegistryError::connection_error("connection refused");
        assert!(connection_err.is_retryable());

        let timeout = RegistryError::Timeout { timeout_ms: 10_000 };
        assert!(timeout.is_retryable());

        let not_found = RegistryError::agent_not_found("weather_agent");
        assert!(!not_found.is_retryable());
    }

    #[test]
    fn test_error_response_conversion() {
        let err = RegistryError::agent_not_found("weather_agent");
        let response: ErrorResponse = err.into();
        assert_eq!(response.code, 404);
        assert!(response.message.contains("weather_agent"));

        let err = RegistryError::invalid_registration("name must not be empty");
        let response: ErrorResponse = err.into();
        assert_eq!(response.code, 400);
    }

    #[test]
    fn test_bind_error_message() {
        let err = RegistryError::bind_error("localhost:8000", "address in use");
        assert_eq!(
            err.to_string(),
            "Failed to bind localhost:8000: address in use"
        );
    }
}
