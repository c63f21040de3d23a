//! Server error types with context and recovery suggestions.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = std::result::Result<T, ServerError>;

/// Error type for server operations with recovery suggestions.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Server configuration is invalid.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Failed to bind to the specified address.
    #[error("Failed to bind to {address}: {source}")]
    BindError {
        address: String,
        #[source]
        source: io::Error,
    },

    /// Runtime server error.
    #[error("Runtime error: {0}")]
    Runtime(#[source] io::Error),

    /// In-flight requests did not finish within the shutdown timeout.
    #[error("Graceful shutdown did not complete within {}s", .0.as_secs())]
    ShutdownTimeout(Duration),
}

impl ServerError {
    /// Creates a bind error with address context.
    pub fn bind_error(address: impl ToString, source: io::Error) -> Self {
        Self::BindError {
            address: address.to_string(),
            source,
        }
    }

    /// Returns a unique error code for this error type.
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidConfig(_) => "E001",
            Self::BindError { .. } => "E002",
            Self::Runtime(_) => "E003",
            Self::ShutdownTimeout(_) => "E004",
        }
    }

    /// Determines if this error is potentially recoverable.
    ///
    /// Recoverable errors might succeed if retried or if the environment
    /// changes (a different port, a released address).
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::InvalidConfig(_) | Self::ShutdownTimeout(_) => false,
            Self::BindError { source, .. } => matches!(
                source.kind(),
                io::ErrorKind::PermissionDenied
                    | io::ErrorKind::AddrInUse
                    | io::ErrorKind::AddrNotAvailable
            ),
            Self::Runtime(err) => matches!(
                err.kind(),
                io::ErrorKind::PermissionDenied
                    | io::ErrorKind::Interrupted
                    | io::ErrorKind::TimedOut
                    | io::ErrorKind::ConnectionRefused
            ),
        }
    }

    /// Provides a human-readable suggestion for resolving this error.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::InvalidConfig(_) => {
                Some("Check the command-line flags and environment variables passed to tabflow")
            }
            Self::BindError { source, .. } => match source.kind() {
                io::ErrorKind::PermissionDenied => {
                    Some("Try using a port above 1024 or run with appropriate privileges")
                }
                io::ErrorKind::AddrInUse => Some(
                    "The port is already in use. Try a different port or stop the conflicting service",
                ),
                io::ErrorKind::AddrNotAvailable => {
                    Some("The address is not available. Check network interface configuration")
                }
                _ => Some("Check network configuration and firewall settings"),
            },
            Self::Runtime(err) => match err.kind() {
                io::ErrorKind::PermissionDenied => Some("Check file and network permissions"),
                io::ErrorKind::Interrupted => Some("The operation was interrupted, you may retry"),
                io::ErrorKind::TimedOut => {
                    Some("The operation timed out, consider increasing timeout values")
                }
                _ => None,
            },
            Self::ShutdownTimeout(_) => Some(
                "Long-running workflows were still executing. Raise --shutdown-timeout to let them finish",
            ),
        }
    }

    /// Returns contextual information about this error as key-value pairs
    /// for structured logging.
    pub fn context(&self) -> Vec<(&'static str, String)> {
        let mut context = vec![("error_code", self.error_code().to_string())];

        if let Some(suggestion) = self.suggestion() {
            context.push(("suggestion", suggestion.to_string()));
        }

        context.push(("recoverable", self.is_recoverable().to_string()));

        match self {
            Self::BindError { address, source } => {
                context.push(("address", address.clone()));
                context.push(("io_error_kind", format!("{:?}", source.kind())));
            }
            Self::Runtime(err) => {
                context.push(("io_error_kind", format!("{:?}", err.kind())));
            }
            Self::InvalidConfig(msg) => {
                context.push(("config_error", msg.clone()));
            }
            Self::ShutdownTimeout(timeout) => {
                context.push(("shutdown_timeout_secs", timeout.as_secs().to_string()));
            }
        }

        context
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_are_unique() {
        let errors = [
            ServerError::InvalidConfig("test".to_string()),
            ServerError::bind_error("127.0.0.1:80", io::Error::other("test")),
            ServerError::Runtime(io::Error::other("test")),
            ServerError::ShutdownTimeout(Duration::from_secs(30)),
        ];

        let codes: Vec<_> = errors.iter().map(ServerError::error_code).collect();
        for i in 0..codes.len() {
            for j in i + 1..codes.len() {
                assert_ne!(codes[i], codes[j], "Error codes must be unique");
            }
        }
    }

    #[test]
    fn address_in_use_is_recoverable() {
        let bind_err = ServerError::bind_error(
            "127.0.0.1:3000",
            io::Error::new(io::ErrorKind::AddrInUse, "address in use"),
        );

        assert!(bind_err.is_recoverable());
        assert!(bind_err.suggestion().unwrap().contains("already in use"));
    }

    #[test]
    fn shutdown_timeout_is_not_recoverable() {
        let error = ServerError::ShutdownTimeout(Duration::from_secs(5));

        assert!(!error.is_recoverable());
        assert_eq!(
            error.to_string(),
            "Graceful shutdown did not complete within 5s"
        );
    }

    #[test]
    fn context_includes_bind_details() {
        let bind_err = ServerError::bind_error(
            "127.0.0.1:80",
            io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"),
        );

        let context = bind_err.context();
        let keys: Vec<&str> = context.iter().map(|(k, _)| *k).collect();

        assert!(keys.contains(&"error_code"));
        assert!(keys.contains(&"suggestion"));
        assert!(keys.contains(&"recoverable"));
        assert!(keys.contains(&"address"));
        assert!(keys.contains(&"io_error_kind"));
    }
}
