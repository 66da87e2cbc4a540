//! Domain layer for the bank projection services.
//!
//! This crate provides:
//! - [`Money`] for exact decimal amounts
//! - [`Transaction`] records decoded from bus payloads, with tolerant
//!   timestamp parsing
//! - [`BalanceSnapshot`] and the [`BalanceProjector`] engine that folds a
//!   transaction into the next snapshot

pub mod balance;
pub mod error;
pub mod money;
pub mod transaction;
pub mod user;

pub use balance::{BalanceProjector, BalanceSnapshot, DEFAULT_CURRENCY, SnapshotId};
pub use error::{DomainError, Result};
pub use money::Money;
pub use transaction::{
    Transaction, TransactionBuilder, TransactionPayload, TransactionType, parse_timestamp,
    parse_timestamp_value,
};
pub use user::UserIdentity;
