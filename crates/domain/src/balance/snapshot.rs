use chrono::{DateTime, Utc};
use common::{AccountId, TransactionId, UserId, Version};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::money::Money;

/// Currency recorded on snapshots when no previous snapshot sets one.
pub const DEFAULT_CURRENCY: &str = "MXN";

/// Unique identifier of a stored balance snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnapshotId(Uuid);

impl SnapshotId {
    /// Creates a new random snapshot ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a snapshot ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for SnapshotId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The materialized balance of an account after one processed transaction.
///
/// A new snapshot is written for every transaction; snapshots are never
/// updated in place. The account's current balance is the snapshot with
/// the most recent `updated_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    pub snapshot_id: SnapshotId,

    pub account_id: AccountId,

    /// Signed net balance. May go negative; no overdraft rule applies here.
    pub balance: Money,

    pub currency: String,

    pub user_id: UserId,

    pub username: String,

    /// When the account's first snapshot was created. Carried forward
    /// unchanged on every later snapshot.
    pub created_at: DateTime<Utc>,

    /// When this snapshot was created. Absent on the account's first snapshot.
    pub updated_at: Option<DateTime<Utc>>,

    /// Per-account sequence number of this snapshot.
    pub version: Version,

    /// The transaction that produced this snapshot.
    pub transaction_id: Option<TransactionId>,
}

impl BalanceSnapshot {
    /// Returns true if this is the account's first snapshot.
    pub fn is_opening(&self) -> bool {
        self.updated_at.is_none()
    }

    /// Returns the point in processing time this snapshot was written.
    pub fn written_at(&self) -> DateTime<Utc> {
        self.updated_at.unwrap_or(self.created_at)
    }
}
