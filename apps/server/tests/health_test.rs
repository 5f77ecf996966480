//! ヘルスチェック統合テスト

mod helpers;

use helpers::{get_request, sample_rate, spawn_app};
use http::StatusCode;
use pretty_assertions::assert_eq;
use ratewatch_infra::mock::MockRateSource;
use ratewatch_shared::{CheckStatus, ReadinessResponse, ReadinessStatus};
use serde_json::Value;

#[tokio::test]
async fn test_health_は常に200() {
    let app = spawn_app(MockRateSource::returning(sample_rate())).await;

    let (status, body) = app.send(get_request("/health")).await;

    assert_eq!(status, StatusCode::OK);
    let actual: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(actual["status"], "healthy");
    assert_eq!(actual["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_db_に接続できればready() {
    let app = spawn_app(MockRateSource::returning(sample_rate())).await;

    let (status, body) = app.send(get_request("/health/ready")).await;

    assert_eq!(status, StatusCode::OK);
    let response: ReadinessResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(response.status, ReadinessStatus::Ready);
    assert_eq!(response.checks["database"], CheckStatus::Ok);
}

#[tokio::test]
async fn test_db_が閉じていれば503() {
    let app = spawn_app(MockRateSource::returning(sample_rate())).await;
    app.pool.close().await;

    let (status, body) = app.send(get_request("/health/ready")).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    let response: ReadinessResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(response.status, ReadinessStatus::NotReady);
    assert_eq!(response.checks["database"], CheckStatus::Error);
}
