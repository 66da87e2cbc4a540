//! Read-side queries over the projected read models.

use common::AccountId;
use domain::{BalanceSnapshot, Transaction};
use read_store::{BalanceRepository, HistoryQuery, TransactionRepository};

use crate::{ProjectionError, Result};

/// Answers balance and history lookups for an account.
#[derive(Clone)]
pub struct AccountQueries<S> {
    store: S,
}

impl<S: BalanceRepository + TransactionRepository> AccountQueries<S> {
    /// Creates queries over the given read store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns the account's current balance snapshot.
    #[tracing::instrument(skip(self))]
    pub async fn current_balance(&self, account_id: &AccountId) -> Result<BalanceSnapshot> {
        self.store
            .current_snapshot(account_id)
            .await?
            .ok_or_else(|| ProjectionError::NotFound {
                account_id: account_id.clone(),
            })
    }

    /// Returns every balance snapshot of the account, most recent first.
    #[tracing::instrument(skip(self))]
    pub async fn balance_history(
        &self,
        account_id: &AccountId,
        query: HistoryQuery,
    ) -> Result<Vec<BalanceSnapshot>> {
        Ok(self.store.snapshot_history(account_id, query).await?)
    }

    /// Returns the account's recorded transactions, most recent first.
    #[tracing::instrument(skip(self))]
    pub async fn transaction_history(
        &self,
        account_id: &AccountId,
        query: HistoryQuery,
    ) -> Result<Vec<Transaction>> {
        Ok(self.store.transaction_history(account_id, query).await?)
    }
}
