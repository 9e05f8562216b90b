//! Shared error type across rulevault crates.

use thiserror::Error;

/// Stable error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Bad or missing configuration (model source, adapter class, url).
    Config,
    /// Backend connection, query, or constraint failure.
    Storage,
    /// Dispatch to a capability the engine does not expose.
    UnknownOperation,
    /// Rule shape violation (arity over the fixed record width).
    Codec,
    /// Dispatch argument that cannot be decoded for the named operation.
    InvalidArgument,
}

impl ErrorCode {
    /// String representation used in logs and test assertions.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Config => "CONFIG",
            ErrorCode::Storage => "STORAGE",
            ErrorCode::UnknownOperation => "UNKNOWN_OPERATION",
            ErrorCode::Codec => "CODEC",
            ErrorCode::InvalidArgument => "INVALID_ARGUMENT",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, RuleVaultError>;

/// Unified error type used by core and store.
///
/// Errors propagate to the immediate caller unmodified: no retry, no
/// wrapping layer, message preserved end-to-end from adapter through
/// facade to caller.
#[derive(Debug, Error)]
pub enum RuleVaultError {
    #[error("config: {0}")]
    Config(String),
    #[error("storage: {0}")]
    Storage(String),
    #[error("unknown operation: {0}")]
    UnknownOperation(String),
    #[error("codec: {0}")]
    Codec(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl RuleVaultError {
    /// Map the error to its stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            RuleVaultError::Config(_) => ErrorCode::Config,
            RuleVaultError::Storage(_) => ErrorCode::Storage,
            RuleVaultError::UnknownOperation(_) => ErrorCode::UnknownOperation,
            RuleVaultError::Codec(_) => ErrorCode::Codec,
            RuleVaultError::InvalidArgument(_) => ErrorCode::InvalidArgument,
        }
    }
}
