//! HTTP 統合テスト共通ヘルパー
//!
//! 実際のルーターをマイグレーション済みのインメモリ SQLite と
//! モックの為替レート取得元で組み立て、`oneshot` でリクエストを送る。

#![allow(dead_code)]

use std::{
    io,
    sync::{Arc, Mutex},
};

use axum::{
    Router,
    body::{Body, to_bytes},
};
use http::{Request, StatusCode, header};
use ratewatch_domain::currency::{CurrencyPair, CurrencyRate};
use ratewatch_infra::{
    SqliteSubscriberRepository,
    SubscriberRepository,
    db,
    mock::MockRateSource,
};
use ratewatch_server::app_builder::{AppDeps, build_router};
use rust_decimal_macros::dec;
use sqlx::SqlitePool;
use tower::ServiceExt;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt::MakeWriter;

/// テスト対象のアプリケーション
pub struct TestApp {
    pub router:      Router,
    pub pool:        SqlitePool,
    pub subscribers: Arc<dyn SubscriberRepository>,
}

impl TestApp {
    /// リクエストを送り、ステータスとボディを返す
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("リクエストの処理に失敗");
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("ボディの読み取りに失敗");
        (status, body.to_vec())
    }

    /// `POST /subscribe` をフォーム形式で送る
    pub async fn subscribe(&self, email: &str) -> (StatusCode, Vec<u8>) {
        self.send(subscribe_request(email)).await
    }

    /// 保存済みの購読者
    pub async fn emails(&self) -> Vec<String> {
        self.subscribers
            .list_emails()
            .await
            .expect("購読者一覧の取得に失敗")
    }
}

/// 実際の SQLite リポジトリを使うアプリケーションを作成する
pub async fn spawn_app(rate_source: MockRateSource) -> TestApp {
    let pool = setup_pool().await;
    let subscribers: Arc<dyn SubscriberRepository> =
        Arc::new(SqliteSubscriberRepository::new(pool.clone()));

    spawn_app_with(rate_source, Arc::clone(&subscribers), pool).await
}

/// 任意のリポジトリでアプリケーションを作成する
pub async fn spawn_app_with(
    rate_source: MockRateSource,
    subscribers: Arc<dyn SubscriberRepository>,
    pool: SqlitePool,
) -> TestApp {
    let router = build_router(AppDeps {
        rate_source: Arc::new(rate_source),
        subscribers: Arc::clone(&subscribers),
        pool: pool.clone(),
    });

    TestApp {
        router,
        pool,
        subscribers,
    }
}

/// マイグレーション適用済みのインメモリ DB
pub async fn setup_pool() -> SqlitePool {
    let pool = db::create_in_memory_pool()
        .await
        .expect("インメモリ DB の作成に失敗");
    db::run_migrations(&pool)
        .await
        .expect("マイグレーションに失敗");
    pool
}

/// 2024-05-01T00:00:00Z 時点の USD/UAH レート
pub fn sample_rate() -> CurrencyRate {
    CurrencyRate::from_unix(
        CurrencyPair::USD_UAH,
        1_714_521_600,
        Some(dec!(39.7006)),
        Some(dec!(39.25)),
        None,
    )
    .expect("レートの作成に失敗")
}

pub fn subscribe_request(email: &str) -> Request<Body> {
    Request::post("/subscribe")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!("email={}", email.replace('@', "%40"))))
        .expect("リクエストの作成に失敗")
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::get(uri)
        .body(Body::empty())
        .expect("リクエストの作成に失敗")
}

/// テスト中に出力されたログを保持するバッファ
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    /// `needle` が出力された回数
    pub fn count(&self, needle: &str) -> usize {
        self.contents().matches(needle).count()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// 現在のスレッドのログを DEBUG レベルまで捕捉する
///
/// `#[tokio::test]`（current_thread）で使う。ガードを破棄すると捕捉を終える。
pub fn capture_logs() -> (CapturedLogs, DefaultGuard) {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();

    (logs, tracing::subscriber::set_default(subscriber))
}
