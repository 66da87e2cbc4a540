//! Domain error types.

use common::AccountId;
use thiserror::Error;

/// Errors raised while decoding transactions or projecting balances.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A monetary amount could not be constructed from the given input.
    #[error("Invalid amount '{input}': {reason}")]
    InvalidAmount { input: String, reason: &'static str },

    /// A timestamp string matched none of the accepted formats.
    #[error("Invalid timestamp format: {0}")]
    InvalidTimestamp(String),

    /// A timestamp was supplied as something other than a string.
    #[error("Invalid timestamp type: expected string, found {0}")]
    InvalidTimestampType(&'static str),

    /// The transaction type is neither DEPOSIT nor WITHDRAW.
    #[error("Invalid transaction type: {0}")]
    InvalidTransactionType(String),

    /// No user identity is registered for the account.
    #[error("User for account {0} not found")]
    UnknownAccount(AccountId),

    /// The transaction payload does not match the expected schema.
    #[error("Invalid transaction payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
}

impl DomainError {
    pub(crate) fn invalid_amount(input: impl Into<String>, reason: &'static str) -> Self {
        DomainError::InvalidAmount {
            input: input.into(),
            reason,
        }
    }
}

/// Result type for domain operations.
pub type Result<T> = std::result::Result<T, DomainError>;
