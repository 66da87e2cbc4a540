//! Projection processor for feeding transactions to projections.

use domain::Transaction;
use futures_util::StreamExt;
use read_store::TransactionRepository;

use crate::Result;
use crate::projection::Projection;

/// Delivers one transaction to one projection, recording the outcome.
pub async fn deliver(projection: &dyn Projection, transaction: &Transaction) -> Result<()> {
    match projection.handle(transaction).await {
        Ok(()) => {
            metrics::counter!("projections_events_processed", "projection" => projection.name())
                .increment(1);
            Ok(())
        }
        Err(e) => {
            tracing::warn!(
                projection = projection.name(),
                transaction_id = %transaction.id(),
                error = %e,
                "projection failed"
            );
            Err(e)
        }
    }
}

/// Delivers transactions to the registered projections.
///
/// The processor supports:
/// - Single transaction delivery: fans a new transaction out to all
///   projections, in registration order
/// - Rebuild: resets all projections and replays the stored transaction log
pub struct ProjectionProcessor<L: TransactionRepository> {
    log: L,
    projections: Vec<Box<dyn Projection>>,
}

impl<L: TransactionRepository> ProjectionProcessor<L> {
    /// Creates a new processor replaying from the given transaction log.
    pub fn new(log: L) -> Self {
        Self {
            log,
            projections: Vec::new(),
        }
    }

    /// Registers a projection with this processor.
    pub fn register(&mut self, projection: Box<dyn Projection>) {
        self.projections.push(projection);
    }

    /// Returns the number of registered projections.
    pub fn projection_count(&self) -> usize {
        self.projections.len()
    }

    /// Delivers a single transaction to all registered projections.
    ///
    /// Stops at the first failing projection; the ones before it have
    /// already applied the transaction.
    #[tracing::instrument(skip(self, transaction), fields(transaction_id = %transaction.id()))]
    pub async fn process_transaction(&self, transaction: &Transaction) -> Result<()> {
        for projection in &self.projections {
            deliver(projection.as_ref(), transaction).await?;
        }
        Ok(())
    }

    /// Resets all projections and replays the stored transaction log in
    /// arrival order.
    ///
    /// Returns the number of transactions replayed.
    #[tracing::instrument(skip(self))]
    pub async fn rebuild_balances(&self) -> Result<u64> {
        for projection in &self.projections {
            projection.reset().await?;
        }

        let mut stream = self.log.stream_transactions().await?;
        let mut replayed: u64 = 0;

        while let Some(result) = stream.next().await {
            let transaction = result?;
            self.process_transaction(&transaction).await?;
            replayed += 1;
        }

        tracing::info!(replayed, "rebuild complete");

        Ok(replayed)
    }
}
