//! Error types for configuration handling.

use thiserror::Error;

/// Result type for configuration operations
pub type ConnectResult<T> = Result<T, ConnectError>;

/// Error types for configuration handling
///
/// Every failure is terminal for the call that raised it; nothing here is
/// retried.
#[derive(Error, Debug)]
pub enum ConnectError {
    /// Configuration error - detected at client construction time
    ///
    /// Examples: no usable host, invalid field values, unreadable config file.
    /// The client must not proceed to connect after one of these.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The connection URI could not be parsed
    #[error("Invalid connection URI: {0}")]
    InvalidUri(#[from] url::ParseError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConnectError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        ConnectError::Configuration(message.into())
    }

    /// Check if this error came from configuration validation
    pub fn is_configuration(&self) -> bool {
        matches!(self, ConnectError::Configuration(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let err = ConnectError::config("no host");
        assert!(err.is_configuration());

        let err: ConnectError = url::ParseError::EmptyHost.into();
        assert!(!err.is_configuration());
    }

    #[test]
    fn test_error_display() {
        let err = ConnectError::config("at least one host must be supplied");
        assert_eq!(
            err.to_string(),
            "Configuration error: at least one host must be supplied"
        );
    }
}
