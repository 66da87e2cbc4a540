//! Storage for the projected read models.
//!
//! Balance snapshots form an append-only log per account; the latest by
//! `updated_at` is the account's current balance. Transactions are kept
//! as a history log in arrival order.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod store;
pub mod users;

pub use error::{Result, StoreError};
pub use memory::InMemoryReadStore;
pub use postgres::PostgresReadStore;
pub use query::HistoryQuery;
pub use store::{AppendOptions, BalanceRepository, TransactionRepository, TransactionStream};
pub use users::{InMemoryUserDirectory, UserDirectory};
