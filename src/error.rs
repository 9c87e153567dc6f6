//! Error types for dataproto

use thiserror::Error;

pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// Failures raised by the JSON-RPC substrate.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("Failed to start backend process: {0}")]
    ProcessStart(String),

    #[error("Backend connection is not open")]
    NotConnected,

    #[error("Backend process terminated unexpectedly")]
    Terminated,

    #[error("Request cancelled before a response arrived")]
    Cancelled,

    #[error("Server error [{code}]: {message}")]
    Server { code: i32, message: String },

    #[error("Protocol violation: {0}")]
    Protocol(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl RpcError {
    pub fn error_code(&self) -> i32 {
        match self {
            Self::Server { code, .. } => *code,
            Self::Terminated => crate::rpc::protocol::error_codes::SERVER_TERMINATED,
            Self::Cancelled => crate::rpc::protocol::error_codes::REQUEST_CANCELLED,
            Self::NotConnected => -32003,
            _ => -32000,
        }
    }

    pub fn is_terminated(&self) -> bool {
        matches!(self, Self::Terminated)
            || matches!(self, Self::Server { code, .. }
                if *code == crate::rpc::protocol::error_codes::SERVER_TERMINATED)
    }
}

/// Failures raised by the extension layer itself.
#[derive(Debug, Error)]
pub enum ClientError {
    /// A registration offered message types the feature does not own.
    ///
    /// This is a wiring defect in the host composition, never a runtime
    /// condition, so it is surfaced immediately and never caught internally.
    #[error("Registration offered [{offered}] but the feature owns [{owned}]")]
    Registration { offered: String, owned: String },

    #[error("Unsupported save format: {0}")]
    UnsupportedFormat(String),

    #[error("{0}")]
    Rpc(#[from] RpcError),
}

impl ClientError {
    pub fn is_wiring_error(&self) -> bool {
        matches!(self, Self::Registration { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_error_names_both_sides() {
        let err = ClientError::Registration {
            offered: "query/executeString".to_string(),
            owned: "connection/connect, connection/disconnect".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("query/executeString"));
        assert!(text.contains("connection/connect"));
        assert!(err.is_wiring_error());
    }

    #[test]
    fn rpc_error_codes() {
        assert_eq!(RpcError::Terminated.error_code(), -32099);
        assert_eq!(
            RpcError::Server {
                code: -32601,
                message: "method not found".to_string()
            }
            .error_code(),
            -32601
        );
        assert!(
            RpcError::Server {
                code: -32099,
                message: "gone".to_string()
            }
            .is_terminated()
        );
    }
}
