//! Balance and history read endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use chrono::{DateTime, Utc};
use common::AccountId;
use domain::{BalanceSnapshot, Transaction};
use read_store::HistoryQuery;
use serde::Serialize;

use crate::error::ApiError;
use crate::state::{AppState, Directory, ReadStore};

/// A balance snapshot as exposed by the read API.
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub account_id: String,
    pub balance: String,
    pub currency: String,
    pub user_id: i64,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<BalanceSnapshot> for BalanceResponse {
    fn from(snapshot: BalanceSnapshot) -> Self {
        Self {
            account_id: snapshot.account_id.to_string(),
            balance: snapshot.balance.to_string(),
            currency: snapshot.currency,
            user_id: snapshot.user_id.as_i64(),
            username: snapshot.username,
            created_at: snapshot.created_at,
            updated_at: snapshot.updated_at,
        }
    }
}

/// GET /balance/{account_id}: the account's current balance.
#[tracing::instrument(skip(state))]
pub async fn current<S: ReadStore, U: Directory>(
    State(state): State<Arc<AppState<S, U>>>,
    Path(account_id): Path<String>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let snapshot = state
        .queries
        .current_balance(&AccountId::new(account_id))
        .await?;
    Ok(Json(snapshot.into()))
}

/// GET /balance/{account_id}/history: every balance snapshot, newest first.
#[tracing::instrument(skip(state))]
pub async fn history<S: ReadStore, U: Directory>(
    State(state): State<Arc<AppState<S, U>>>,
    Path(account_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<BalanceResponse>>, ApiError> {
    let snapshots = state
        .queries
        .balance_history(&AccountId::new(account_id), query)
        .await?;
    Ok(Json(snapshots.into_iter().map(Into::into).collect()))
}

/// GET /account/{account_id}/transactions: recorded transactions, newest first.
#[tracing::instrument(skip(state))]
pub async fn transactions<S: ReadStore, U: Directory>(
    State(state): State<Arc<AppState<S, U>>>,
    Path(account_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<Transaction>>, ApiError> {
    let transactions = state
        .queries
        .transaction_history(&AccountId::new(account_id), query)
        .await?;
    Ok(Json(transactions))
}
