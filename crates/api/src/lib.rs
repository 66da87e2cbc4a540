//! HTTP service for the bank projections.
//!
//! Receives transaction events from the pub/sub sidecar, feeds them to the
//! balance and history projections, and serves the resulting read models,
//! with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use projections::{
    AccountQueries, BalanceProjection, ProjectionProcessor, TransactionHistoryProjection,
};
use read_store::InMemoryUserDirectory;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use routes::subscriber::{BALANCE_HANDLER_ROUTE, HANDLER_ROUTE, HISTORY_HANDLER_ROUTE};
use state::{AppState, Directory, ReadStore, Subscription};

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: ReadStore, U: Directory>(
    state: Arc<AppState<S, U>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::render))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/dapr/subscribe", get(routes::subscriber::subscriptions::<S, U>))
        .route(HANDLER_ROUTE, post(routes::subscriber::handle_all::<S, U>))
        .route(
            BALANCE_HANDLER_ROUTE,
            post(routes::subscriber::handle_balance::<S, U>),
        )
        .route(
            HISTORY_HANDLER_ROUTE,
            post(routes::subscriber::handle_history::<S, U>),
        )
        .route("/balance/{account_id}", get(routes::balance::current::<S, U>))
        .route(
            "/balance/{account_id}/history",
            get(routes::balance::history::<S, U>),
        )
        .route(
            "/account/{account_id}/transactions",
            get(routes::balance::transactions::<S, U>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state over a read store and user directory.
pub fn create_state<S: ReadStore, U: Directory>(
    store: S,
    users: U,
    config: &Config,
) -> Arc<AppState<S, U>> {
    let balance = BalanceProjection::new(store.clone(), users).with_max_retries(config.max_retries);
    let history = TransactionHistoryProjection::new(store.clone());

    let mut processor = ProjectionProcessor::new(store.clone());
    processor.register(Box::new(balance.clone()));
    processor.register(Box::new(history.clone()));

    Arc::new(AppState {
        balance,
        history,
        processor,
        queries: AccountQueries::new(store),
        subscription: Subscription {
            pubsub_name: config.pubsub_name.clone(),
            topic: config.pubsub_topic.clone(),
        },
    })
}

/// Creates the default application state: the configured fallback owner
/// answers for every account.
pub fn create_default_state<S: ReadStore>(
    store: S,
    config: &Config,
) -> Arc<AppState<S, InMemoryUserDirectory>> {
    let users = match &config.default_user {
        Some(identity) => InMemoryUserDirectory::with_fallback(identity.clone()),
        None => InMemoryUserDirectory::new(),
    };
    create_state(store, users, config)
}
