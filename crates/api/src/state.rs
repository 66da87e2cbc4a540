//! Shared application state.

use projections::{
    AccountQueries, BalanceProjection, ProjectionProcessor, TransactionHistoryProjection,
};
use read_store::{BalanceRepository, TransactionRepository, UserDirectory};

/// Storage backing both read models.
pub trait ReadStore: BalanceRepository + TransactionRepository + Clone + 'static {}

impl<T: BalanceRepository + TransactionRepository + Clone + 'static> ReadStore for T {}

/// Directory of account owners usable from handlers.
pub trait Directory: UserDirectory + Clone + 'static {}

impl<T: UserDirectory + Clone + 'static> Directory for T {}

/// Pub/sub subscription announced to the sidecar.
#[derive(Debug, Clone)]
pub struct Subscription {
    pub pubsub_name: String,
    pub topic: String,
}

/// Shared application state accessible from all handlers.
pub struct AppState<S: ReadStore, U: Directory> {
    pub balance: BalanceProjection<S, U>,
    pub history: TransactionHistoryProjection<S>,
    pub processor: ProjectionProcessor<S>,
    pub queries: AccountQueries<S>,
    pub subscription: Subscription,
}
