use std::fmt::Display;

/// JSON-RPC 2.0 error codes, plus the MCP "not initialized" code.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum ErrorCode {
    ParseError,
    InvalidRequest,
    MethodNotFound,
    InvalidParams,
    InternalError,
    ServerNotInitialized,
}

impl ErrorCode {
    pub fn code(&self) -> i64 {
        match self {
            ErrorCode::ParseError => -32700,
            ErrorCode::InvalidRequest => -32600,
            ErrorCode::MethodNotFound => -32601,
            ErrorCode::InvalidParams => -32602,
            ErrorCode::InternalError => -32603,
            ErrorCode::ServerNotInitialized => -32002,
        }
    }
}

impl Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ErrorCode::ParseError => write!(f, "Parse error"),
            ErrorCode::InvalidRequest => write!(f, "Invalid Request"),
            ErrorCode::MethodNotFound => write!(f, "Method not found"),
            ErrorCode::InvalidParams => write!(f, "Invalid params"),
            ErrorCode::InternalError => write!(f, "Internal error"),
            ErrorCode::ServerNotInitialized => write!(f, "Server not initialized"),
        }
    }
}

/// An error destined for the `error` member of a response.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcError {
    pub code: ErrorCode,
    pub message: String,
}

impl RpcError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Failing to serialize our own result is an internal error.
impl From<serde_json::Error> for RpcError {
    fn from(e: serde_json::Error) -> Self {
        Self {
            code: ErrorCode::InternalError,
            message: format!("{}: {}", ErrorCode::InternalError, e),
        }
    }
}

impl From<ErrorCode> for RpcError {
    fn from(code: ErrorCode) -> Self {
        Self {
            code,
            message: code.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(ErrorCode::ParseError.code(), -32700);
        assert_eq!(ErrorCode::ServerNotInitialized.code(), -32002);
        assert_eq!(RpcError::from(ErrorCode::MethodNotFound).message, "Method not found");
    }

    #[test]
    fn test_serialization_failure_is_internal() {
        let e = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error = RpcError::from(e);
        assert_eq!(error.code, ErrorCode::InternalError);
        assert_eq!(error.code.code(), -32603);
        assert!(error.message.starts_with("Internal error: "));
    }
}
