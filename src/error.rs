//! Error types for the indexed store.

use thiserror::Error;

/// Boxed error returned by caller-supplied index functions.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Main error type for store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Index not found: {0}")]
    IndexNotFound(String),

    #[error("Index function {name} failed: {source}")]
    IndexFunction {
        name: String,
        #[source]
        source: BoxError,
    },
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
