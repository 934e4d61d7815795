//! Error types for the HTTP transport layer.

use sheetrun_types::{DiagnosticError, SheetrunError};
use thiserror::Error;

/// Errors that can occur in the HTTP transport.
#[derive(Debug, Error)]
pub enum HttpTransportError {
    /// The host and port do not form a socket address.
    #[error("invalid listen address: {addr}")]
    InvalidAddress {
        /// The rejected address string.
        addr: String,
    },
    /// Failed to bind to the TCP address.
    #[error("failed to bind on {addr}: {source}")]
    Bind {
        /// The address string.
        addr: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The HTTP server encountered an I/O error while serving.
    #[error("server error: {0}")]
    Serve(String),
}

impl From<HttpTransportError> for SheetrunError {
    fn from(e: HttpTransportError) -> Self {
        SheetrunError::internal(e.to_string())
    }
}

impl DiagnosticError for HttpTransportError {
    fn hint(&self) -> Option<String> {
        match self {
            Self::Bind { .. } => Some("Another process may already be using this port.".into()),
            Self::InvalidAddress { .. } => Some("The host must be an IP address.".into()),
            Self::Serve(_) => None,
        }
    }

    fn fix(&self) -> Option<String> {
        match self {
            Self::Bind { .. } => Some("Pick another port: sheetrun serve --port 10001".into()),
            Self::InvalidAddress { .. } => {
                Some("Use an address such as:\n  [server]\n  host = \"127.0.0.1\"".into())
            }
            Self::Serve(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_error_displays_address() {
        let err = HttpTransportError::Bind {
            addr: "127.0.0.1:8080".into(),
            source: std::io::Error::new(std::io::ErrorKind::AddrInUse, "in use"),
        };
        assert!(err.to_string().contains("127.0.0.1:8080"));
        assert!(err.fix().expect("fix").contains("--port"));
    }

    #[test]
    fn serve_error_displays_message() {
        let err = HttpTransportError::Serve("connection reset".into());
        assert!(err.to_string().contains("connection reset"));
    }
}
