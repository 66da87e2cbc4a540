use std::pin::Pin;

use async_trait::async_trait;
use common::{AccountId, Version};
use domain::{BalanceSnapshot, Transaction};
use futures_core::Stream;

use crate::{HistoryQuery, Result};

/// Options for appending balance snapshots.
#[derive(Debug, Clone, Default)]
pub struct AppendOptions {
    /// Expected latest snapshot version of the account for optimistic
    /// concurrency control. If None, no version check is performed.
    pub expected_version: Option<Version>,
}

impl AppendOptions {
    /// Creates options with no version check.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options expecting the account's latest snapshot to be at a
    /// specific version.
    pub fn expect_version(version: Version) -> Self {
        Self {
            expected_version: Some(version),
        }
    }

    /// Creates options expecting the account to have no snapshots yet.
    pub fn expect_new() -> Self {
        Self {
            expected_version: Some(Version::initial()),
        }
    }

    /// Creates the options that make appending `snapshot` conditional on
    /// nothing else having been written since its predecessor.
    pub fn following(snapshot: &BalanceSnapshot) -> Self {
        Self::expect_version(Version::new(snapshot.version.as_i64() - 1))
    }
}

/// A stream of stored transactions.
pub type TransactionStream = Pin<Box<dyn Stream<Item = Result<Transaction>> + Send>>;

/// Append-only storage of balance snapshots.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait BalanceRepository: Send + Sync {
    /// Appends a snapshot to the account's log.
    ///
    /// If `options.expected_version` is set, the append fails with
    /// `ConcurrencyConflict` unless the account's latest stored version
    /// equals it. Two snapshots of one account never share a version.
    ///
    /// Returns the version of the appended snapshot.
    async fn append_snapshot(
        &self,
        snapshot: BalanceSnapshot,
        options: AppendOptions,
    ) -> Result<Version>;

    /// Returns the account's current snapshot: the one with the most
    /// recent `updated_at`, the latest written winning ties.
    async fn current_snapshot(&self, account_id: &AccountId) -> Result<Option<BalanceSnapshot>>;

    /// Returns the account's snapshots ordered by `updated_at`, newest first.
    ///
    /// Returns an empty list for an unknown account.
    async fn snapshot_history(
        &self,
        account_id: &AccountId,
        query: HistoryQuery,
    ) -> Result<Vec<BalanceSnapshot>>;

    /// Returns the account's snapshot with the highest version.
    ///
    /// This is the snapshot the next append must follow, whatever the
    /// `updated_at` ordering says.
    async fn latest_snapshot(&self, account_id: &AccountId) -> Result<Option<BalanceSnapshot>>;

    /// Returns the total number of stored snapshots.
    async fn snapshot_count(&self) -> Result<usize>;

    /// Removes every snapshot. Used before rebuilding balances from history.
    async fn clear_snapshots(&self) -> Result<()>;
}

/// Storage of the transaction history log.
#[async_trait]
pub trait TransactionRepository: Send + Sync {
    /// Stores a transaction.
    ///
    /// Returns false if a transaction with the same ID was already stored;
    /// the stored copy is left untouched.
    async fn save_transaction(&self, transaction: Transaction) -> Result<bool>;

    /// Returns the account's transactions ordered by timestamp, newest first.
    ///
    /// Returns an empty list for an unknown account.
    async fn transaction_history(
        &self,
        account_id: &AccountId,
        query: HistoryQuery,
    ) -> Result<Vec<Transaction>>;

    /// Streams every stored transaction in arrival order.
    async fn stream_transactions(&self) -> Result<TransactionStream>;

    /// Returns the total number of stored transactions.
    async fn transaction_count(&self) -> Result<usize>;
}
