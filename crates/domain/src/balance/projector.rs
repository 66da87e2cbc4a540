//! The balance projection engine.

use chrono::{DateTime, Utc};
use common::{AccountId, Version};

use super::snapshot::{BalanceSnapshot, DEFAULT_CURRENCY, SnapshotId};
use crate::error::{DomainError, Result};
use crate::money::Money;
use crate::transaction::{Transaction, TransactionType};
use crate::user::UserIdentity;

/// Folds a transaction into an account's balance.
///
/// The projector holds no state: given the previous snapshot (if any), the
/// movement, and the account owner's identity, it computes the next
/// snapshot. Persisting the result is the caller's job.
///
/// The very first snapshot of an account opens at the signed amount of its
/// first transaction, so an opening withdrawal yields a negative balance.
#[derive(Debug, Clone)]
pub struct BalanceProjector {
    currency: String,
}

impl BalanceProjector {
    /// Creates a projector opening new accounts in [`DEFAULT_CURRENCY`].
    pub fn new() -> Self {
        Self {
            currency: DEFAULT_CURRENCY.to_string(),
        }
    }

    /// Creates a projector opening new accounts in the given currency.
    pub fn with_currency(currency: impl Into<String>) -> Self {
        Self {
            currency: currency.into(),
        }
    }

    /// Projects a movement using the current wall-clock time.
    pub fn project(
        &self,
        account_id: &AccountId,
        amount: Money,
        transaction_type: TransactionType,
        previous: Option<&BalanceSnapshot>,
        user: Option<&UserIdentity>,
    ) -> Result<BalanceSnapshot> {
        self.project_at(
            account_id,
            amount,
            transaction_type,
            previous,
            user,
            Utc::now(),
        )
    }

    /// Projects a full transaction record, tagging the snapshot with its ID.
    pub fn project_transaction(
        &self,
        transaction: &Transaction,
        previous: Option<&BalanceSnapshot>,
        user: Option<&UserIdentity>,
        now: DateTime<Utc>,
    ) -> Result<BalanceSnapshot> {
        let mut snapshot = self.project_at(
            transaction.account_id(),
            transaction.amount(),
            transaction.transaction_type(),
            previous,
            user,
            now,
        )?;
        snapshot.transaction_id = Some(transaction.id().clone());
        Ok(snapshot)
    }

    /// Projects a movement at an explicit processing time.
    pub fn project_at(
        &self,
        account_id: &AccountId,
        amount: Money,
        transaction_type: TransactionType,
        previous: Option<&BalanceSnapshot>,
        user: Option<&UserIdentity>,
        now: DateTime<Utc>,
    ) -> Result<BalanceSnapshot> {
        let user = user.ok_or_else(|| DomainError::UnknownAccount(account_id.clone()))?;
        let delta = transaction_type.signed(amount);

        let snapshot = match previous {
            None => BalanceSnapshot {
                snapshot_id: SnapshotId::new(),
                account_id: account_id.clone(),
                balance: delta,
                currency: self.currency.clone(),
                user_id: user.user_id,
                username: user.username.clone(),
                created_at: now,
                updated_at: None,
                version: Version::first(),
                transaction_id: None,
            },
            Some(prev) => {
                let balance = prev
                    .balance
                    .checked_add(delta)
                    .ok_or_else(|| DomainError::InvalidAmount {
                        input: amount.to_string(),
                        reason: "balance overflow",
                    })?;

                BalanceSnapshot {
                    snapshot_id: SnapshotId::new(),
                    account_id: account_id.clone(),
                    balance,
                    currency: prev.currency.clone(),
                    user_id: user.user_id,
                    username: user.username.clone(),
                    created_at: prev.created_at,
                    // Never older than the predecessor's
                    updated_at: Some(prev.updated_at.map_or(now, |last| last.max(now))),
                    version: prev.version.next(),
                    transaction_id: None,
                }
            }
        };

        tracing::debug!(
            account_id = %account_id,
            transaction_type = %transaction_type,
            %amount,
            balance = %snapshot.balance,
            version = %snapshot.version,
            "projected balance"
        );

        Ok(snapshot)
    }
}

impl Default for BalanceProjector {
    fn default() -> Self {
        Self::new()
    }
}
