//! Projections for the query side of the bank services.
//!
//! This crate provides:
//! - [`Projection`] trait for folding transactions into read models
//! - [`BalanceProjection`], keeping per-account balance snapshots with
//!   optimistic concurrency and bounded retry
//! - [`TransactionHistoryProjection`], keeping the transaction log
//! - [`ProjectionProcessor`] for fan-out delivery and rebuilds
//! - [`AccountQueries`] for balance and history lookups

pub mod error;
pub mod processor;
pub mod projection;
pub mod queries;
pub mod views;

pub use error::{ProjectionError, Result};
pub use processor::{ProjectionProcessor, deliver};
pub use projection::Projection;
pub use queries::AccountQueries;
pub use views::{BalanceProjection, DEFAULT_MAX_RETRIES, TransactionHistoryProjection};
