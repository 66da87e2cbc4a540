//! Transaction history projection.

use async_trait::async_trait;
use domain::Transaction;
use read_store::TransactionRepository;

use crate::Result;
use crate::projection::Projection;

/// Appends every transaction to the account history log.
///
/// Redelivered transactions are recognized by ID and stored once. The log
/// is the source balances are rebuilt from, so resetting leaves it intact.
#[derive(Clone)]
pub struct TransactionHistoryProjection<S> {
    store: S,
}

impl<S: TransactionRepository> TransactionHistoryProjection<S> {
    /// Creates a history projection over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S: TransactionRepository> Projection for TransactionHistoryProjection<S> {
    fn name(&self) -> &'static str {
        "TransactionHistoryProjection"
    }

    #[tracing::instrument(skip(self, transaction), fields(transaction_id = %transaction.id()))]
    async fn handle(&self, transaction: &Transaction) -> Result<()> {
        let stored = self.store.save_transaction(transaction.clone()).await?;
        if stored {
            tracing::info!(account_id = %transaction.account_id(), "transaction recorded");
        } else {
            tracing::debug!("transaction already recorded");
        }
        Ok(())
    }

    async fn reset(&self) -> Result<()> {
        Ok(())
    }
}
