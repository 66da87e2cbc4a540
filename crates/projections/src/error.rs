//! Projection error types.

use common::AccountId;
use domain::DomainError;
use read_store::StoreError;
use thiserror::Error;

/// Errors that can occur during projection processing.
#[derive(Debug, Error)]
pub enum ProjectionError {
    /// The transaction could not be projected.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// An error occurred in the read store.
    #[error("Read store error: {0}")]
    Store(#[from] StoreError),

    /// The account has no balance snapshot.
    #[error("Balance for account {account_id} not found")]
    NotFound { account_id: AccountId },

    /// Every attempt to append the next snapshot lost a version race.
    #[error("Gave up projecting account {account_id} after {attempts} conflicting attempts")]
    RetriesExhausted { account_id: AccountId, attempts: u32 },
}

impl ProjectionError {
    /// Returns true if redelivering the same transaction can never succeed.
    pub fn is_permanent(&self) -> bool {
        matches!(self, ProjectionError::Domain(_))
    }
}

/// Result type for projection operations.
pub type Result<T> = std::result::Result<T, ProjectionError>;
