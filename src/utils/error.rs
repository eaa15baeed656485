//! Error types for the marketplace indexer.
//!
//! This module defines the error enumeration used throughout the crate,
//! built with `thiserror` so failures carry enough context to act on.

use thiserror::Error;

/// Custom error type for indexer operations.
///
/// Covers the failure modes of the ingestion pipeline: RPC communication,
/// database persistence, event mapping, and configuration.
#[derive(Debug, Error)]
pub enum IndexerError {
    /// Errors encountered during database operations.
    ///
    /// Wraps `sqlx::Error` via `#[from]` so persistence code can use `?`
    /// directly.
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    /// Errors interacting with the chain RPC endpoint.
    ///
    /// Covers network failures, timeouts, and JSON-RPC error responses.
    /// The poll loop treats these as transient and backs off.
    #[error("RPC error: {0}")]
    RpcError(String),

    /// Errors while mapping an event payload onto a local record.
    ///
    /// A malformed payload or a required field missing under every known
    /// alias. These are per-event failures and never fatal to a batch.
    #[error("Mapping error: {0}")]
    MappingError(String),

    /// Errors related to configuration.
    ///
    /// Missing required fields or invalid values supplied to the builder.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Errors from environment variable operations.
    #[error("Environment variable error: {0}")]
    EnvVarError(#[from] std::env::VarError),

    /// Generic errors for operations that don't fit other categories.
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl IndexerError {
    /// Returns `true` if this error is a unique-constraint violation.
    ///
    /// Duplicate natural keys are expected under at-least-once delivery and
    /// are treated as successful no-ops by the poll loop.
    #[must_use]
    pub fn is_unique_violation(&self) -> bool {
        match self {
            IndexerError::DatabaseError(sqlx::Error::Database(db)) => {
                db.code().as_deref() == Some("23505")
            }
            _ => false,
        }
    }
}

/// Type alias for Results using `IndexerError`.
pub type Result<T> = std::result::Result<T, IndexerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rpc_error_display() {
        let err = IndexerError::RpcError("connection refused".to_string());
        assert_eq!(err.to_string(), "RPC error: connection refused");
    }

    #[test]
    fn test_mapping_error_is_not_unique_violation() {
        let err = IndexerError::MappingError("missing field".to_string());
        assert!(!err.is_unique_violation());
    }
}
