use std::sync::Arc;

use async_trait::async_trait;
use common::{AccountId, Version};
use domain::{BalanceSnapshot, Transaction};
use tokio::sync::RwLock;

use crate::{
    HistoryQuery, Result, StoreError,
    store::{AppendOptions, BalanceRepository, TransactionRepository, TransactionStream},
};

/// In-memory read store implementation for tests and local runs.
///
/// Stores snapshots and transactions in insertion order and provides the
/// same interface as the PostgreSQL implementation. Clones share storage.
#[derive(Clone, Default)]
pub struct InMemoryReadStore {
    snapshots: Arc<RwLock<Vec<BalanceSnapshot>>>,
    transactions: Arc<RwLock<Vec<Transaction>>>,
}

impl InMemoryReadStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears all snapshots and transactions.
    pub async fn clear(&self) {
        self.snapshots.write().await.clear();
        self.transactions.write().await.clear();
    }
}

/// Newest first by `updated_at` (absent sorts oldest), then latest inserted.
fn newest_first(snapshots: &[BalanceSnapshot], account_id: &AccountId) -> Vec<BalanceSnapshot> {
    let mut matching: Vec<(usize, &BalanceSnapshot)> = snapshots
        .iter()
        .enumerate()
        .filter(|(_, s)| &s.account_id == account_id)
        .collect();
    matching.sort_by(|(ia, a), (ib, b)| b.updated_at.cmp(&a.updated_at).then(ib.cmp(ia)));
    matching.into_iter().map(|(_, s)| s.clone()).collect()
}

#[async_trait]
impl BalanceRepository for InMemoryReadStore {
    async fn append_snapshot(
        &self,
        snapshot: BalanceSnapshot,
        options: AppendOptions,
    ) -> Result<Version> {
        let mut store = self.snapshots.write().await;
        let account_id = snapshot.account_id.clone();

        let current_version = store
            .iter()
            .filter(|s| s.account_id == account_id)
            .map(|s| s.version)
            .max()
            .unwrap_or(Version::initial());

        if let Some(expected) = options.expected_version
            && current_version != expected
        {
            return Err(StoreError::ConcurrencyConflict {
                account_id,
                expected,
                actual: current_version,
            });
        }

        // Unique (account, version) constraint simulation
        if store
            .iter()
            .any(|s| s.account_id == account_id && s.version == snapshot.version)
        {
            return Err(StoreError::ConcurrencyConflict {
                account_id,
                expected: options.expected_version.unwrap_or(current_version),
                actual: current_version,
            });
        }

        let version = snapshot.version;
        store.push(snapshot);
        Ok(version)
    }

    async fn current_snapshot(&self, account_id: &AccountId) -> Result<Option<BalanceSnapshot>> {
        let store = self.snapshots.read().await;
        Ok(newest_first(&store, account_id).into_iter().next())
    }

    async fn snapshot_history(
        &self,
        account_id: &AccountId,
        query: HistoryQuery,
    ) -> Result<Vec<BalanceSnapshot>> {
        let store = self.snapshots.read().await;
        Ok(query.apply(newest_first(&store, account_id)))
    }

    async fn latest_snapshot(&self, account_id: &AccountId) -> Result<Option<BalanceSnapshot>> {
        let store = self.snapshots.read().await;
        Ok(store
            .iter()
            .filter(|s| &s.account_id == account_id)
            .max_by_key(|s| s.version)
            .cloned())
    }

    async fn snapshot_count(&self) -> Result<usize> {
        Ok(self.snapshots.read().await.len())
    }

    async fn clear_snapshots(&self) -> Result<()> {
        self.snapshots.write().await.clear();
        Ok(())
    }
}

#[async_trait]
impl TransactionRepository for InMemoryReadStore {
    async fn save_transaction(&self, transaction: Transaction) -> Result<bool> {
        let mut store = self.transactions.write().await;
        if store.iter().any(|t| t.id() == transaction.id()) {
            return Ok(false);
        }
        store.push(transaction);
        Ok(true)
    }

    async fn transaction_history(
        &self,
        account_id: &AccountId,
        query: HistoryQuery,
    ) -> Result<Vec<Transaction>> {
        let store = self.transactions.read().await;
        let mut matching: Vec<(usize, &Transaction)> = store
            .iter()
            .enumerate()
            .filter(|(_, t)| t.account_id() == account_id)
            .collect();
        matching.sort_by(|(ia, a), (ib, b)| b.timestamp().cmp(&a.timestamp()).then(ib.cmp(ia)));

        Ok(query.apply(matching.into_iter().map(|(_, t)| t.clone()).collect()))
    }

    async fn stream_transactions(&self) -> Result<TransactionStream> {
        use futures_util::stream;

        let transactions = self.transactions.read().await.clone();
        let stream = stream::iter(transactions.into_iter().map(Ok));
        Ok(Box::pin(stream))
    }

    async fn transaction_count(&self) -> Result<usize> {
        Ok(self.transactions.read().await.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use common::UserId;
    use domain::{Money, SnapshotId, TransactionType};
    use futures_util::StreamExt;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 8, 30, 18, 24, 6).unwrap()
    }

    fn create_snapshot(
        account: &str,
        version: i64,
        balance: &str,
        updated_at: Option<DateTime<Utc>>,
    ) -> BalanceSnapshot {
        BalanceSnapshot {
            snapshot_id: SnapshotId::new(),
            account_id: AccountId::new(account),
            balance: balance.parse().unwrap(),
            currency: "MXN".to_string(),
            user_id: UserId::new(1),
            username: "test_user".to_string(),
            created_at: t0(),
            updated_at,
            version: Version::new(version),
            transaction_id: None,
        }
    }

    fn create_transaction(id: &str, account: &str, minutes: i64) -> Transaction {
        Transaction::builder()
            .id(id)
            .account_id(account)
            .amount(Money::from_cents(100))
            .transaction_type(TransactionType::Deposit)
            .timestamp(t0() + Duration::minutes(minutes))
            .build()
    }

    #[tokio::test]
    async fn append_and_read_current() {
        let store = InMemoryReadStore::new();
        let snapshot = create_snapshot("ACC-1", 1, "500.00", None);

        let version = store
            .append_snapshot(snapshot.clone(), AppendOptions::expect_new())
            .await
            .unwrap();
        assert_eq!(version, Version::first());

        let current = store
            .current_snapshot(&AccountId::new("ACC-1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(current, snapshot);
    }

    #[tokio::test]
    async fn current_is_latest_updated_at() {
        let store = InMemoryReadStore::new();
        store
            .append_snapshot(create_snapshot("ACC-1", 1, "1", None), AppendOptions::new())
            .await
            .unwrap();
        store
            .append_snapshot(
                create_snapshot("ACC-1", 2, "2", Some(t0() + Duration::minutes(2))),
                AppendOptions::new(),
            )
            .await
            .unwrap();
        store
            .append_snapshot(
                create_snapshot("ACC-1", 3, "3", Some(t0() + Duration::minutes(1))),
                AppendOptions::new(),
            )
            .await
            .unwrap();

        let current = store
            .current_snapshot(&AccountId::new("ACC-1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(current.version, Version::new(2));
    }

    #[tokio::test]
    async fn latest_snapshot_follows_version_not_clock() {
        let store = InMemoryReadStore::new();
        for (version, updated_at) in [
            (1, None),
            (2, Some(t0() + Duration::hours(1))),
            (3, Some(t0())),
        ] {
            store
                .append_snapshot(
                    create_snapshot("ACC-1", version, &version.to_string(), updated_at),
                    AppendOptions::new(),
                )
                .await
                .unwrap();
        }
        let account = AccountId::new("ACC-1");

        let latest = store.latest_snapshot(&account).await.unwrap().unwrap();
        assert_eq!(latest.version, Version::new(3));
        let current = store.current_snapshot(&account).await.unwrap().unwrap();
        assert_eq!(current.version, Version::new(2));
    }

    #[tokio::test]
    async fn ties_go_to_latest_written() {
        let store = InMemoryReadStore::new();
        let at = Some(t0());
        store
            .append_snapshot(create_snapshot("ACC-1", 1, "1", at), AppendOptions::new())
            .await
            .unwrap();
        store
            .append_snapshot(create_snapshot("ACC-1", 2, "2", at), AppendOptions::new())
            .await
            .unwrap();

        let current = store
            .current_snapshot(&AccountId::new("ACC-1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(current.version, Version::new(2));
    }

    #[tokio::test]
    async fn history_is_newest_first() {
        let store = InMemoryReadStore::new();
        for (version, minutes) in [(1, None), (2, Some(1)), (3, Some(2))] {
            let updated_at = minutes.map(|m| t0() + Duration::minutes(m));
            store
                .append_snapshot(
                    create_snapshot("ACC-1", version, "1", updated_at),
                    AppendOptions::new(),
                )
                .await
                .unwrap();
        }
        store
            .append_snapshot(create_snapshot("ACC-2", 1, "9", None), AppendOptions::new())
            .await
            .unwrap();

        let history = store
            .snapshot_history(&AccountId::new("ACC-1"), HistoryQuery::all())
            .await
            .unwrap();
        let versions: Vec<i64> = history.iter().map(|s| s.version.as_i64()).collect();
        assert_eq!(versions, vec![3, 2, 1]);

        let page = store
            .snapshot_history(&AccountId::new("ACC-1"), HistoryQuery::all().offset(1).limit(1))
            .await
            .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].version, Version::new(2));
    }

    #[tokio::test]
    async fn unknown_account_has_empty_history() {
        let store = InMemoryReadStore::new();
        let account = AccountId::new("nobody");

        assert!(store.current_snapshot(&account).await.unwrap().is_none());
        assert!(
            store
                .snapshot_history(&account, HistoryQuery::all())
                .await
                .unwrap()
                .is_empty()
        );
        assert!(store.latest_snapshot(&account).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn expected_version_conflict() {
        let store = InMemoryReadStore::new();
        store
            .append_snapshot(create_snapshot("ACC-1", 1, "1", None), AppendOptions::expect_new())
            .await
            .unwrap();

        let result = store
            .append_snapshot(
                create_snapshot("ACC-1", 1, "2", None),
                AppendOptions::expect_new(),
            )
            .await;

        match result {
            Err(StoreError::ConcurrencyConflict {
                expected, actual, ..
            }) => {
                assert_eq!(expected, Version::initial());
                assert_eq!(actual, Version::first());
            }
            other => panic!("expected conflict, got {other:?}"),
        }
        assert_eq!(store.snapshot_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn duplicate_version_without_expectation_conflicts() {
        let store = InMemoryReadStore::new();
        store
            .append_snapshot(create_snapshot("ACC-1", 1, "1", None), AppendOptions::new())
            .await
            .unwrap();

        let result = store
            .append_snapshot(create_snapshot("ACC-1", 1, "1", None), AppendOptions::new())
            .await;
        assert!(matches!(result, Err(StoreError::ConcurrencyConflict { .. })));
    }

    #[tokio::test]
    async fn clear_snapshots_keeps_transactions() {
        let store = InMemoryReadStore::new();
        store
            .append_snapshot(create_snapshot("ACC-1", 1, "1", None), AppendOptions::new())
            .await
            .unwrap();
        store
            .save_transaction(create_transaction("tx-1", "ACC-1", 0))
            .await
            .unwrap();

        store.clear_snapshots().await.unwrap();

        assert_eq!(store.snapshot_count().await.unwrap(), 0);
        assert_eq!(store.transaction_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn duplicate_transaction_is_not_stored_twice() {
        let store = InMemoryReadStore::new();
        let tx = create_transaction("tx-1", "ACC-1", 0);

        assert!(store.save_transaction(tx.clone()).await.unwrap());
        assert!(!store.save_transaction(tx).await.unwrap());
        assert_eq!(store.transaction_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn transaction_history_newest_first() {
        let store = InMemoryReadStore::new();
        store
            .save_transaction(create_transaction("tx-1", "ACC-1", 0))
            .await
            .unwrap();
        store
            .save_transaction(create_transaction("tx-2", "ACC-1", 10))
            .await
            .unwrap();
        store
            .save_transaction(create_transaction("tx-3", "ACC-2", 5))
            .await
            .unwrap();

        let history = store
            .transaction_history(&AccountId::new("ACC-1"), HistoryQuery::all())
            .await
            .unwrap();
        let ids: Vec<&str> = history.iter().map(|t| t.id().as_str()).collect();
        assert_eq!(ids, vec!["tx-2", "tx-1"]);
    }

    #[tokio::test]
    async fn stream_preserves_arrival_order() {
        let store = InMemoryReadStore::new();
        store
            .save_transaction(create_transaction("tx-late", "ACC-1", 10))
            .await
            .unwrap();
        store
            .save_transaction(create_transaction("tx-early", "ACC-1", 0))
            .await
            .unwrap();

        let mut stream = store.stream_transactions().await.unwrap();
        let mut ids = Vec::new();
        while let Some(tx) = stream.next().await {
            ids.push(tx.unwrap().id().to_string());
        }
        assert_eq!(ids, vec!["tx-late", "tx-early"]);
    }
}
