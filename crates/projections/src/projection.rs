//! Core projection trait.

use async_trait::async_trait;
use domain::Transaction;

use crate::Result;

/// A projection that folds transactions into a read model.
///
/// Projections receive every transaction published on the bus and keep
/// their read model in the read store.
#[async_trait]
pub trait Projection: Send + Sync {
    /// Returns the name of this projection.
    fn name(&self) -> &'static str;

    /// Handles a single transaction, updating the projection's read model.
    async fn handle(&self, transaction: &Transaction) -> Result<()>;

    /// Resets the projection's read model to its initial state.
    async fn reset(&self) -> Result<()>;
}
