use async_trait::async_trait;
use common::{AccountId, Version};
use domain::{BalanceSnapshot, Transaction};
use futures_util::{StreamExt, stream};
use sqlx::{
    PgPool, Row,
    postgres::{PgPoolOptions, PgRow},
};

use crate::{
    HistoryQuery, Result, StoreError,
    store::{AppendOptions, BalanceRepository, TransactionRepository, TransactionStream},
};

/// Rows fetched per round trip when streaming the transaction log.
const STREAM_BATCH_SIZE: i64 = 500;

/// PostgreSQL-backed read store.
///
/// Snapshots and transactions are stored as JSONB documents next to the
/// columns they are queried by. The `(account_id, version)` unique
/// constraint makes snapshot appends conditional.
#[derive(Clone)]
pub struct PostgresReadStore {
    pool: PgPool,
}

impl PostgresReadStore {
    /// Creates a new PostgreSQL read store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to the database with a pool of at most `max_connections`.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_snapshot(row: PgRow) -> Result<BalanceSnapshot> {
        let document: serde_json::Value = row.try_get("document")?;
        Ok(serde_json::from_value(document)?)
    }

    fn row_to_transaction(row: &PgRow) -> Result<Transaction> {
        let document: serde_json::Value = row.try_get("document")?;
        Ok(serde_json::from_value(document)?)
    }
}

#[async_trait]
impl BalanceRepository for PostgresReadStore {
    async fn append_snapshot(
        &self,
        snapshot: BalanceSnapshot,
        options: AppendOptions,
    ) -> Result<Version> {
        let account_id = snapshot.account_id.clone();
        let version = snapshot.version;
        let document = serde_json::to_value(&snapshot)?;

        let mut tx = self.pool.begin().await?;

        if let Some(expected) = options.expected_version {
            let current_version: Option<i64> = sqlx::query_scalar(
                "SELECT MAX(version) FROM balance_snapshots WHERE account_id = $1",
            )
            .bind(account_id.as_str())
            .fetch_one(&mut *tx)
            .await?;

            let actual = Version::new(current_version.unwrap_or(0));

            if actual != expected {
                return Err(StoreError::ConcurrencyConflict {
                    account_id,
                    expected,
                    actual,
                });
            }
        }

        sqlx::query(
            r#"
            INSERT INTO balance_snapshots (snapshot_id, account_id, version, updated_at, document)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(snapshot.snapshot_id.as_uuid())
        .bind(account_id.as_str())
        .bind(version.as_i64())
        .bind(snapshot.updated_at)
        .bind(document)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            // A concurrent writer got this version in first
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some("unique_account_version")
            {
                return StoreError::ConcurrencyConflict {
                    account_id: account_id.clone(),
                    expected: options.expected_version.unwrap_or(Version::initial()),
                    actual: version,
                };
            }
            StoreError::Database(e)
        })?;

        tx.commit().await?;

        tracing::debug!(
            account_id = %account_id,
            version = version.as_i64(),
            "Balance snapshot appended"
        );

        Ok(version)
    }

    async fn current_snapshot(&self, account_id: &AccountId) -> Result<Option<BalanceSnapshot>> {
        let row: Option<PgRow> = sqlx::query(
            r#"
            SELECT document
            FROM balance_snapshots
            WHERE account_id = $1
            ORDER BY updated_at DESC NULLS LAST, seq DESC
            LIMIT 1
            "#,
        )
        .bind(account_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_snapshot).transpose()
    }

    async fn snapshot_history(
        &self,
        account_id: &AccountId,
        query: HistoryQuery,
    ) -> Result<Vec<BalanceSnapshot>> {
        let rows = sqlx::query(
            r#"
            SELECT document
            FROM balance_snapshots
            WHERE account_id = $1
            ORDER BY updated_at DESC NULLS LAST, seq DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(account_id.as_str())
        .bind(query.sql_limit())
        .bind(query.sql_offset())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_snapshot).collect()
    }

    async fn latest_snapshot(&self, account_id: &AccountId) -> Result<Option<BalanceSnapshot>> {
        let row: Option<PgRow> = sqlx::query(
            r#"
            SELECT document
            FROM balance_snapshots
            WHERE account_id = $1
            ORDER BY version DESC
            LIMIT 1
            "#,
        )
        .bind(account_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_snapshot).transpose()
    }

    async fn snapshot_count(&self) -> Result<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM balance_snapshots")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as usize)
    }

    async fn clear_snapshots(&self) -> Result<()> {
        sqlx::query("TRUNCATE TABLE balance_snapshots")
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl TransactionRepository for PostgresReadStore {
    async fn save_transaction(&self, transaction: Transaction) -> Result<bool> {
        let document = serde_json::to_value(&transaction)?;

        let result = sqlx::query(
            r#"
            INSERT INTO transactions (id, account_id, timestamp, document)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(transaction.id().as_str())
        .bind(transaction.account_id().as_str())
        .bind(transaction.timestamp())
        .bind(document)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn transaction_history(
        &self,
        account_id: &AccountId,
        query: HistoryQuery,
    ) -> Result<Vec<Transaction>> {
        let rows = sqlx::query(
            r#"
            SELECT document
            FROM transactions
            WHERE account_id = $1
            ORDER BY timestamp DESC, seq DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(account_id.as_str())
        .bind(query.sql_limit())
        .bind(query.sql_offset())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_transaction).collect()
    }

    async fn stream_transactions(&self) -> Result<TransactionStream> {
        let pool = self.pool.clone();

        // Keyset pagination over `seq` so the stream owns its pool handle
        let batches = stream::unfold(Some(0_i64), move |cursor| {
            let pool = pool.clone();
            async move {
                let after = cursor?;
                let rows = sqlx::query(
                    r#"
                    SELECT seq, document
                    FROM transactions
                    WHERE seq > $1
                    ORDER BY seq ASC
                    LIMIT $2
                    "#,
                )
                .bind(after)
                .bind(STREAM_BATCH_SIZE)
                .fetch_all(&pool)
                .await;

                match rows {
                    Err(e) => Some((vec![Err(StoreError::Database(e))], None)),
                    Ok(rows) if rows.is_empty() => None,
                    Ok(rows) => {
                        let next = if (rows.len() as i64) < STREAM_BATCH_SIZE {
                            None
                        } else {
                            rows.last().and_then(|r| r.try_get::<i64, _>("seq").ok())
                        };
                        let items: Vec<Result<Transaction>> =
                            rows.iter().map(Self::row_to_transaction).collect();
                        Some((items, next))
                    }
                }
            }
        })
        .flat_map(stream::iter);

        Ok(Box::pin(batches))
    }

    async fn transaction_count(&self) -> Result<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM transactions")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as usize)
    }
}
