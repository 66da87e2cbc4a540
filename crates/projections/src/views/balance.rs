//! Balance projection: one snapshot per applied transaction.

use async_trait::async_trait;
use chrono::Utc;
use domain::{BalanceProjector, BalanceSnapshot, Transaction};
use read_store::{AppendOptions, BalanceRepository, StoreError, UserDirectory};

use crate::projection::Projection;
use crate::{ProjectionError, Result};

/// Default number of attempts before giving up on a contended account.
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Keeps each account's balance snapshot log up to date.
///
/// For every transaction the projection resolves the account owner, reads
/// the account's highest-version snapshot, runs the [`BalanceProjector`],
/// and appends the result conditionally on the snapshot it was computed
/// from. A lost race re-reads and recomputes.
#[derive(Clone)]
pub struct BalanceProjection<S, U> {
    store: S,
    users: U,
    projector: BalanceProjector,
    max_retries: u32,
}

impl<S: BalanceRepository, U: UserDirectory> BalanceProjection<S, U> {
    /// Creates a balance projection over the given store and user directory.
    pub fn new(store: S, users: U) -> Self {
        Self {
            store,
            users,
            projector: BalanceProjector::new(),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Replaces the projector, e.g. to open accounts in another currency.
    pub fn with_projector(mut self, projector: BalanceProjector) -> Self {
        self.projector = projector;
        self
    }

    /// Sets the number of attempts made before failing with
    /// [`ProjectionError::RetriesExhausted`]. At least one attempt is made.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    /// Returns the underlying snapshot store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Applies a transaction and returns the snapshot that was stored.
    #[tracing::instrument(
        skip(self, transaction),
        fields(
            transaction_id = %transaction.id(),
            account_id = %transaction.account_id(),
        )
    )]
    pub async fn apply(&self, transaction: &Transaction) -> Result<BalanceSnapshot> {
        let account_id = transaction.account_id();
        let user = self.users.find_by_account(account_id).await?;

        let mut attempts = 0;
        loop {
            attempts += 1;

            let previous = self.store.latest_snapshot(account_id).await?;
            let snapshot = self.projector.project_transaction(
                transaction,
                previous.as_ref(),
                user.as_ref(),
                Utc::now(),
            )?;

            let options = AppendOptions::following(&snapshot);
            match self.store.append_snapshot(snapshot.clone(), options).await {
                Ok(_) => {
                    tracing::info!(
                        balance = %snapshot.balance,
                        version = %snapshot.version,
                        "balance updated"
                    );
                    return Ok(snapshot);
                }
                Err(StoreError::ConcurrencyConflict { actual, .. }) => {
                    metrics::counter!("balance_projection_conflicts").increment(1);

                    if attempts >= self.max_retries {
                        tracing::warn!(attempts, "giving up on contended account");
                        return Err(ProjectionError::RetriesExhausted {
                            account_id: account_id.clone(),
                            attempts,
                        });
                    }

                    tracing::debug!(attempts, %actual, "snapshot version moved, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

#[async_trait]
impl<S: BalanceRepository, U: UserDirectory> Projection for BalanceProjection<S, U> {
    fn name(&self) -> &'static str {
        "BalanceProjection"
    }

    async fn handle(&self, transaction: &Transaction) -> Result<()> {
        self.apply(transaction).await.map(|_| ())
    }

    async fn reset(&self) -> Result<()> {
        self.store.clear_snapshots().await?;
        Ok(())
    }
}
