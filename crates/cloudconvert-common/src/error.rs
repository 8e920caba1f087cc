//! Common error types used throughout the CloudConvert integration.
//!
//! Upstream API failures carry the status code plus the machine-readable
//! `code` and `message` CloudConvert returns in its error body.

/// Common error type for the CloudConvert integration.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// CloudConvert answered with a non-success status.
    #[error(
        "CloudConvert API request failed with status {status}{}",
        api_detail(.code.as_deref(), .message.as_deref())
    )]
    Api {
        /// HTTP status code.
        status: u16,
        /// Machine-readable error code from the response body.
        code: Option<String>,
        /// Human-readable error message from the response body.
        message: Option<String>,
    },

    /// The request never produced a response (connect, TLS, body read).
    #[error("HTTP transport error: {0}")]
    Transport(String),

    /// The job definition could not be used as a request body.
    #[error("Invalid job definition: {0}")]
    InvalidDefinition(String),

    /// A required node parameter was not supplied.
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    /// A node parameter had an unusable value.
    #[error("Invalid value for parameter '{name}': {reason}")]
    InvalidParameter {
        /// Parameter name.
        name: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// The resource/operation pair is not implemented.
    #[error("Operation '{operation}' is not supported for resource '{resource}'")]
    UnsupportedOperation {
        /// Requested resource.
        resource: String,
        /// Requested operation.
        operation: String,
    },

    /// The upstream answered with something that is not the expected JSON.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Per-node static storage could not be read or written.
    #[error("Storage error: {0}")]
    Storage(String),

    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn api_detail(code: Option<&str>, message: Option<&str>) -> String {
    match message {
        Some(message) => format!(" - {}: {}", code.unwrap_or("UNKNOWN"), message),
        None => String::new(),
    }
}

impl Error {
    /// Create a new Api error.
    pub fn api(status: u16, code: Option<String>, message: Option<String>) -> Self {
        Self::Api {
            status,
            code,
            message,
        }
    }

    /// Create a new Transport error.
    pub fn transport<S: Into<String>>(msg: S) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a new InvalidDefinition error.
    pub fn invalid_definition<S: Into<String>>(msg: S) -> Self {
        Self::InvalidDefinition(msg.into())
    }

    /// Create a new MissingParameter error.
    pub fn missing_parameter<S: Into<String>>(name: S) -> Self {
        Self::MissingParameter(name.into())
    }

    /// Create a new InvalidParameter error.
    pub fn invalid_parameter<N: Into<String>, R: Into<String>>(name: N, reason: R) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a new UnsupportedOperation error.
    pub fn unsupported<R: Into<String>, O: Into<String>>(resource: R, operation: O) -> Self {
        Self::UnsupportedOperation {
            resource: resource.into(),
            operation: operation.into(),
        }
    }

    /// Create a new InvalidResponse error.
    pub fn invalid_response<S: Into<String>>(msg: S) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Create a new Storage error.
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        Self::Storage(msg.into())
    }

    /// HTTP status of an upstream API failure, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display_with_upstream_detail() {
        let err = Error::api(
            422,
            Some("INVALID_DATA".to_string()),
            Some("The given data was invalid.".to_string()),
        );
        assert_eq!(
            err.to_string(),
            "CloudConvert API request failed with status 422 - INVALID_DATA: The given data was invalid."
        );
    }

    #[test]
    fn test_api_error_display_without_body() {
        let err = Error::api(500, None, None);
        assert_eq!(
            err.to_string(),
            "CloudConvert API request failed with status 500"
        );
        assert_eq!(err.status(), Some(500));
    }

    #[test]
    fn test_api_error_message_without_code() {
        let err = Error::api(401, None, Some("Unauthenticated.".to_string()));
        assert_eq!(
            err.to_string(),
            "CloudConvert API request failed with status 401 - UNKNOWN: Unauthenticated."
        );
    }

    #[test]
    fn test_error_display() {
        let err = Error::missing_parameter("jobId");
        assert_eq!(err.to_string(), "Missing required parameter: jobId");

        let err = Error::unsupported("job", "archive");
        assert_eq!(
            err.to_string(),
            "Operation 'archive' is not supported for resource 'job'"
        );

        let err = Error::invalid_parameter("status", "unknown value 'done'");
        assert_eq!(
            err.to_string(),
            "Invalid value for parameter 'status': unknown value 'done'"
        );

        let err = Error::invalid_definition("expected value at line 1 column 1");
        assert_eq!(
            err.to_string(),
            "Invalid job definition: expected value at line 1 column 1"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = Error::from(io_err);
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(err.status(), None);
    }
}
