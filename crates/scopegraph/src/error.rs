//! Error taxonomy for the fallible surfaces of scopegraph.
//!
//! Structural operations (`add`, `remove`, `connect`) report expected
//! conditions through their `bool` result and never fail. Only turning
//! declarative configuration into live descriptors can go wrong.

/// Errors produced while resolving channel and port declarations.
#[derive(Debug, thiserror::Error)]
pub enum ScopeGraphError {
    #[error("unknown signal kind: {name}")]
    UnknownSignalKind { name: String },

    #[error("signal kind already registered: {name}")]
    DuplicateSignalKind { name: String },

    #[error("signal kind {name} is reserved and cannot be declared")]
    ReservedSignalKind { name: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] serde_json::Error),
}

/// Result type for scopegraph operations.
pub type Result<T> = std::result::Result<T, ScopeGraphError>;
