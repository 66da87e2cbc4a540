//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p read-store --test postgres_integration -- --test-threads=1
//! ```

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use common::{AccountId, UserId, Version};
use domain::{BalanceSnapshot, Money, SnapshotId, Transaction, TransactionType};
use futures_util::StreamExt;
use read_store::{
    AppendOptions, BalanceRepository, HistoryQuery, PostgresReadStore, StoreError,
    TransactionRepository,
};
use sqlx::PgPool;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();

            sqlx::raw_sql(include_str!(
                "../../../migrations/001_create_projection_tables.sql"
            ))
            .execute(&temp_pool)
            .await
            .unwrap();

            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

async fn get_test_store() -> PostgresReadStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE balance_snapshots, transactions")
        .execute(&pool)
        .await
        .unwrap();

    PostgresReadStore::new(pool)
}

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
        .amount(Money::from_cents(2550))
        .transaction_type(TransactionType::Withdraw)
        .status("COMPLETED")
        .timestamp(t0() + Duration::minutes(minutes))
        .build()
}

#[tokio::test]
async fn append_and_read_current_snapshot() {
    let store = get_test_store().await;
    let snapshot = create_snapshot("ACC-PG-1", 1, "1000.45", None);

    let version = store
        .append_snapshot(snapshot.clone(), AppendOptions::expect_new())
        .await
        .unwrap();
    assert_eq!(version, Version::first());

    let current = store
        .current_snapshot(&AccountId::new("ACC-PG-1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(current, snapshot);
    assert_eq!(current.balance.to_string(), "1000.45");
}

#[tokio::test]
async fn current_snapshot_prefers_latest_update() {
    let store = get_test_store().await;
    let account = AccountId::new("ACC-PG-2");

    for (version, balance, minutes) in [(1, "10", None), (2, "20", Some(5)), (3, "30", Some(2))] {
        let snapshot = create_snapshot(
            account.as_str(),
            version,
            balance,
            minutes.map(|m| t0() + Duration::minutes(m)),
        );
        store
            .append_snapshot(snapshot, AppendOptions::new())
            .await
            .unwrap();
    }

    let current = store.current_snapshot(&account).await.unwrap().unwrap();
    assert_eq!(current.version, Version::new(2));

    let history = store
        .snapshot_history(&account, HistoryQuery::all())
        .await
        .unwrap();
    let versions: Vec<i64> = history.iter().map(|s| s.version.as_i64()).collect();
    assert_eq!(versions, vec![2, 3, 1]);
}

#[tokio::test]
async fn snapshot_history_paging() {
    let store = get_test_store().await;
    let account = AccountId::new("ACC-PG-3");

    for version in 1..=4 {
        let updated_at = (version > 1).then(|| t0() + Duration::minutes(version));
        store
            .append_snapshot(
                create_snapshot(account.as_str(), version, "1", updated_at),
                AppendOptions::new(),
            )
            .await
            .unwrap();
    }

    let page = store
        .snapshot_history(&account, HistoryQuery::all().offset(1).limit(2))
        .await
        .unwrap();
    let versions: Vec<i64> = page.iter().map(|s| s.version.as_i64()).collect();
    assert_eq!(versions, vec![3, 2]);

    let unknown = store
        .snapshot_history(&AccountId::new("ACC-NONE"), HistoryQuery::all())
        .await
        .unwrap();
    assert!(unknown.is_empty());
}

#[tokio::test]
async fn stale_expected_version_conflicts() {
    let store = get_test_store().await;
    let account = AccountId::new("ACC-PG-4");

    store
        .append_snapshot(
            create_snapshot(account.as_str(), 1, "1", None),
            AppendOptions::expect_new(),
        )
        .await
        .unwrap();

    let result = store
        .append_snapshot(
            create_snapshot(account.as_str(), 1, "2", None),
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
        other => panic!("expected concurrency conflict, got {:?}", other),
    }

    assert_eq!(store.snapshot_count().await.unwrap(), 1);
}

#[tokio::test]
async fn duplicate_version_hits_unique_constraint() {
    let store = get_test_store().await;
    let account = AccountId::new("ACC-PG-5");

    store
        .append_snapshot(
            create_snapshot(account.as_str(), 1, "1", None),
            AppendOptions::new(),
        )
        .await
        .unwrap();

    let result = store
        .append_snapshot(
            create_snapshot(account.as_str(), 1, "2", None),
            AppendOptions::new(),
        )
        .await;
    assert!(matches!(
        result,
        Err(StoreError::ConcurrencyConflict { .. })
    ));
    let latest = store.latest_snapshot(&account).await.unwrap().unwrap();
    assert_eq!(latest.version, Version::first());
    assert_eq!(latest.balance.to_string(), "1");
}

#[tokio::test]
async fn latest_snapshot_ignores_clock_skew() {
    let store = get_test_store().await;
    let account = AccountId::new("ACC-PG-9");

    for (version, updated_at) in [
        (1, None),
        (2, Some(t0() + Duration::hours(1))),
        (3, Some(t0())),
    ] {
        store
            .append_snapshot(
                create_snapshot(account.as_str(), version, "1", updated_at),
                AppendOptions::new(),
            )
            .await
            .unwrap();
    }

    let latest = store.latest_snapshot(&account).await.unwrap().unwrap();
    assert_eq!(latest.version, Version::new(3));
    let current = store.current_snapshot(&account).await.unwrap().unwrap();
    assert_eq!(current.version, Version::new(2));
}

#[tokio::test]
async fn oversized_paging_is_saturated() {
    let store = get_test_store().await;
    let account = AccountId::new("ACC-PG-10");

    store
        .append_snapshot(
            create_snapshot(account.as_str(), 1, "1", None),
            AppendOptions::new(),
        )
        .await
        .unwrap();
    store
        .save_transaction(create_transaction("tx-big", account.as_str(), 0))
        .await
        .unwrap();

    let snapshots = store
        .snapshot_history(&account, HistoryQuery::all().limit(usize::MAX))
        .await
        .unwrap();
    assert_eq!(snapshots.len(), 1);

    let transactions = store
        .transaction_history(&account, HistoryQuery::all().offset(usize::MAX))
        .await
        .unwrap();
    assert!(transactions.is_empty());
}

#[tokio::test]
async fn transactions_are_deduplicated_and_ordered() {
    let store = get_test_store().await;
    let account = AccountId::new("ACC-PG-6");

    assert!(
        store
            .save_transaction(create_transaction("tx-1", account.as_str(), 0))
            .await
            .unwrap()
    );
    assert!(
        store
            .save_transaction(create_transaction("tx-2", account.as_str(), 10))
            .await
            .unwrap()
    );
    assert!(
        !store
            .save_transaction(create_transaction("tx-1", account.as_str(), 20))
            .await
            .unwrap()
    );

    let history = store
        .transaction_history(&account, HistoryQuery::all())
        .await
        .unwrap();
    let ids: Vec<&str> = history.iter().map(|t| t.id().as_str()).collect();
    assert_eq!(ids, vec!["tx-2", "tx-1"]);
    assert_eq!(history[1].timestamp(), t0());
    assert_eq!(store.transaction_count().await.unwrap(), 2);
}

#[tokio::test]
async fn stream_returns_arrival_order() {
    let store = get_test_store().await;

    for (i, minutes) in [30, 10, 20].into_iter().enumerate() {
        store
            .save_transaction(create_transaction(&format!("tx-{}", i), "ACC-PG-7", minutes))
            .await
            .unwrap();
    }

    let stream = store.stream_transactions().await.unwrap();
    let streamed: Vec<Transaction> = stream.map(|r| r.unwrap()).collect().await;
    let ids: Vec<&str> = streamed.iter().map(|t| t.id().as_str()).collect();
    assert_eq!(ids, vec!["tx-0", "tx-1", "tx-2"]);
}

#[tokio::test]
async fn clear_snapshots_leaves_transactions() {
    let store = get_test_store().await;

    store
        .append_snapshot(create_snapshot("ACC-PG-8", 1, "1", None), AppendOptions::new())
        .await
        .unwrap();
    store
        .save_transaction(create_transaction("tx-keep", "ACC-PG-8", 0))
        .await
        .unwrap();

    store.clear_snapshots().await.unwrap();

    assert_eq!(store.snapshot_count().await.unwrap(), 0);
    assert_eq!(store.transaction_count().await.unwrap(), 1);
}
