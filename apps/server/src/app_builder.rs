//! # ルーター構築
//!
//! `main` と統合テストで同じルーティングを使うため、ルーターの組み立てを
//! ここに集約する。

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use ratewatch_infra::{RateSource, SubscriberRepository};
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;

use crate::handler::{
    RateState,
    ReadinessState,
    SubscriptionState,
    get_rate,
    health_check,
    readiness_check,
    subscribe,
};

/// ルーターが依存するコンポーネント
pub struct AppDeps {
    pub rate_source: Arc<dyn RateSource>,
    pub subscribers: Arc<dyn SubscriberRepository>,
    pub pool:        SqlitePool,
}

/// アプリケーションのルーターを構築する
pub fn build_router(deps: AppDeps) -> Router {
    let readiness_state = Arc::new(ReadinessState { pool: deps.pool });
    let rate_state = Arc::new(RateState {
        rate_source: deps.rate_source,
    });
    let subscription_state = Arc::new(SubscriptionState {
        subscribers: deps.subscribers,
    });

    Router::new()
        .route("/health", get(health_check))
        .merge(
            Router::new()
                .route("/health/ready", get(readiness_check))
                .with_state(readiness_state),
        )
        .merge(
            Router::new()
                .route("/rate", get(get_rate))
                .with_state(rate_state),
        )
        .merge(
            Router::new()
                .route("/subscribe", post(subscribe))
                .with_state(subscription_state),
        )
        .layer(TraceLayer::new_for_http())
}
