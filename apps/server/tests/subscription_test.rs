//! 購読 API 統合テスト
//!
//! 実際のルーターとインメモリ SQLite を使い、`POST /subscribe` の一連の動作を確認する。
//!
//! ## テストケース
//!
//! - 空の状態から登録 → 200 → 同じアドレスで再登録 → 409 → 一覧は 1 件
//! - 大文字小文字だけが異なるアドレスは 409
//! - フォームとして解釈できないリクエストは 400
//! - 永続化エラーは 500
//! - 登録・再登録のログにメールアドレスを残さない

mod helpers;

use std::sync::Arc;

use axum::body::Body;
use helpers::{TestApp, capture_logs, sample_rate, setup_pool, spawn_app, spawn_app_with};
use http::{Request, StatusCode, header};
use pretty_assertions::assert_eq;
use ratewatch_infra::mock::{MockRateSource, MockSubscriberRepository};
use ratewatch_shared::ErrorResponse;
use rstest::rstest;

async fn app() -> TestApp {
    spawn_app(MockRateSource::returning(sample_rate())).await
}

#[tokio::test]
async fn test_登録して再登録すると409になり一覧には1件だけ残る() {
    let app = app().await;
    assert_eq!(app.emails().await, Vec::<String>::new());

    let (status, body) = app.subscribe("a@x.com").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());

    let (status, body) = app.subscribe("a@x.com").await;
    assert_eq!(status, StatusCode::CONFLICT);
    let error: ErrorResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(error.status, 409);

    assert_eq!(app.emails().await, vec!["a@x.com".to_string()]);
}

#[tokio::test]
async fn test_大文字小文字だけが異なるアドレスは409() {
    let app = app().await;

    let (first, _) = app.subscribe("a@x.com").await;
    let (second, _) = app.subscribe("A@X.COM").await;

    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::CONFLICT);
    assert_eq!(app.emails().await, vec!["a@x.com".to_string()]);
}

#[tokio::test]
async fn test_メールアドレスの形式は検証しない() {
    let app = app().await;

    let (status, _) = app.subscribe("not-an-email").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.emails().await, vec!["not-an-email".to_string()]);
}

#[rstest]
#[case::json("application/json", r#"{"email":"a@x.com"}"#)]
#[case::email欠落("application/x-www-form-urlencoded", "name=alice")]
#[case::空ボディ("application/x-www-form-urlencoded", "")]
#[tokio::test]
async fn test_フォームとして解釈できないリクエストは400(
    #[case] content_type: &str,
    #[case] body: &'static str,
) {
    let app = app().await;
    let request = Request::post("/subscribe")
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(body))
        .unwrap();

    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error: ErrorResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(error.status, 400);
    assert_eq!(app.emails().await, Vec::<String>::new());
}

#[tokio::test]
async fn test_永続化エラーは500() {
    let app = spawn_app_with(
        MockRateSource::returning(sample_rate()),
        Arc::new(MockSubscriberRepository::failing()),
        setup_pool().await,
    )
    .await;

    let (status, body) = app.subscribe("a@x.com").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let error: ErrorResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(error, ErrorResponse::internal_error());
}

#[tokio::test]
async fn test_登録と再登録のログにメールアドレスが出力されない() {
    let app = app().await;
    let (logs, _guard) = capture_logs();

    assert_eq!(app.subscribe("private.person@x.com").await.0, StatusCode::OK);
    assert_eq!(
        app.subscribe("private.person@x.com").await.0,
        StatusCode::CONFLICT
    );

    let output = logs.contents();
    assert!(output.contains("subscription.created"), "{output}");
    assert!(output.contains("subscription.duplicate"), "{output}");
    assert!(!output.contains("private.person"), "{output}");
}
