//! Result and error types for the core library

use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

/// Core library error type
///
/// Every ledger failure mode is a dedicated variant so that callers can
/// branch on the outcome instead of parsing messages. None of these are
/// retried inside the core; retry policy belongs to the caller.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Account not found: {0}")]
    AccountNotFound(Uuid),

    #[error("Invalid amount: {0} (must be positive with at most 2 fractional digits)")]
    InvalidAmount(Decimal),

    #[error("Transfer not found: {0}")]
    TransferNotFound(Uuid),

    #[error("Transfer already cancelled: {0}")]
    AlreadyCancelled(Uuid),

    #[error("Deposit claim not found: {0}")]
    ClaimNotFound(Uuid),

    #[error("Deposit claim already settled: {0}")]
    AlreadySettled(Uuid),

    #[error("Webhook signature mismatch")]
    SignatureMismatch,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] duckdb::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an unauthorized error
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let id = Uuid::nil();
        assert_eq!(
            Error::AccountNotFound(id).to_string(),
            format!("Account not found: {}", id)
        );
        assert_eq!(
            Error::SignatureMismatch.to_string(),
            "Webhook signature mismatch"
        );
        assert!(Error::InvalidAmount(Decimal::new(-100, 2))
            .to_string()
            .contains("-1.00"));
    }
}
