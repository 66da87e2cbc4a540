//! Read model views maintained from the transaction stream.

pub mod balance;
pub mod transaction_history;

pub use balance::{BalanceProjection, DEFAULT_MAX_RETRIES};
pub use transaction_history::TransactionHistoryProjection;
