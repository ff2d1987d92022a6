//! Common error types for domain models

use thiserror::Error;

/// Result type for domain operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised while building or validating domain values
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product is not a `from-to` pair
    #[error("Invalid product: {0}")]
    InvalidProduct(String),

    /// Column filter could not be parsed from `property=value` text
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),
}
