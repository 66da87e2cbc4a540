use common::{AccountId, Version};
use thiserror::Error;

/// Errors that can occur when reading or writing projected documents.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Another writer appended a snapshot for the account first.
    /// The expected latest version did not match the stored one.
    #[error(
        "Concurrency conflict for account {account_id}: expected version {expected}, found {actual}"
    )]
    ConcurrencyConflict {
        account_id: AccountId,
        expected: Version,
        actual: Version,
    },

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored document could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
