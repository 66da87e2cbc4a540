//! Pub/sub ingress: subscription registration and CloudEvent handlers.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use domain::Transaction;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::{AppState, Directory, ReadStore};

/// Route receiving every transaction for both projections.
pub const HANDLER_ROUTE: &str = "/subscriber/v1/handler";
/// Route receiving transactions for the balance projection only.
pub const BALANCE_HANDLER_ROUTE: &str = "/subscriber/v1/balance/handler";
/// Route receiving transactions for the history projection only.
pub const HISTORY_HANDLER_ROUTE: &str = "/subscriber/v1/history/handler";

/// CloudEvents 1.0 envelope as delivered by the pub/sub sidecar.
///
/// Every field is required. `data` carries the transaction, normally as a
/// JSON-encoded string; an embedded JSON object is accepted too.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudEvent {
    pub specversion: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub source: String,
    pub id: String,
    pub datacontenttype: String,
    pub data: serde_json::Value,
    pub topic: String,
    pub pubsubname: String,
    pub tracestate: String,
    pub traceid: String,
}

impl CloudEvent {
    /// Decodes the transaction carried in `data`.
    pub fn transaction(&self) -> domain::Result<Transaction> {
        match &self.data {
            serde_json::Value::String(raw) => Transaction::decode(raw),
            other => Transaction::decode_value(other.clone()),
        }
    }
}

/// Outcome reported back to the sidecar.
#[derive(Debug, Serialize)]
pub struct SubscriberResponse {
    pub status: &'static str,
}

impl SubscriberResponse {
    fn success() -> Json<Self> {
        Json(Self { status: "SUCCESS" })
    }
}

/// Entry of the subscription list returned to the sidecar.
#[derive(Debug, Serialize)]
pub struct SubscriptionEntry {
    pub pubsubname: String,
    pub topic: String,
    pub route: &'static str,
}

/// Validates the envelope and decodes its transaction.
fn decode(envelope: Result<Json<CloudEvent>, JsonRejection>) -> Result<Transaction, ApiError> {
    let Json(event) = envelope.map_err(|rejection| ApiError::Drop(rejection.body_text()))?;

    tracing::info!(
        event_id = %event.id,
        event_type = %event.event_type,
        topic = %event.topic,
        "event received"
    );

    Ok(event.transaction()?)
}

/// GET /dapr/subscribe: topics this service wants delivered.
pub async fn subscriptions<S: ReadStore, U: Directory>(
    State(state): State<Arc<AppState<S, U>>>,
) -> Json<Vec<SubscriptionEntry>> {
    Json(vec![SubscriptionEntry {
        pubsubname: state.subscription.pubsub_name.clone(),
        topic: state.subscription.topic.clone(),
        route: HANDLER_ROUTE,
    }])
}

/// POST /subscriber/v1/handler: feeds the transaction to every projection.
#[tracing::instrument(skip(state, envelope))]
pub async fn handle_all<S: ReadStore, U: Directory>(
    State(state): State<Arc<AppState<S, U>>>,
    envelope: Result<Json<CloudEvent>, JsonRejection>,
) -> Result<Json<SubscriberResponse>, ApiError> {
    let transaction = decode(envelope)?;
    state.processor.process_transaction(&transaction).await?;
    Ok(SubscriberResponse::success())
}

/// POST /subscriber/v1/balance/handler: updates the account balance.
#[tracing::instrument(skip(state, envelope))]
pub async fn handle_balance<S: ReadStore, U: Directory>(
    State(state): State<Arc<AppState<S, U>>>,
    envelope: Result<Json<CloudEvent>, JsonRejection>,
) -> Result<Json<SubscriberResponse>, ApiError> {
    let transaction = decode(envelope)?;
    projections::deliver(&state.balance, &transaction).await?;
    Ok(SubscriberResponse::success())
}

/// POST /subscriber/v1/history/handler: records the transaction.
#[tracing::instrument(skip(state, envelope))]
pub async fn handle_history<S: ReadStore, U: Directory>(
    State(state): State<Arc<AppState<S, U>>>,
    envelope: Result<Json<CloudEvent>, JsonRejection>,
) -> Result<Json<SubscriberResponse>, ApiError> {
    let transaction = decode(envelope)?;
    projections::deliver(&state.history, &transaction).await?;
    Ok(SubscriberResponse::success())
}
