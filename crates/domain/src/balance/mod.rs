//! Balance snapshots and the projection engine that produces them.

pub mod projector;
pub mod snapshot;

pub use projector::BalanceProjector;
pub use snapshot::{BalanceSnapshot, DEFAULT_CURRENCY, SnapshotId};
