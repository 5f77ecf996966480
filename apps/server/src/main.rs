//! # RateWatch サーバー
//!
//! USD/UAH の為替レート API と、購読者への日次メール通知を 1 プロセスで提供する。
//!
//! ## 役割
//!
//! - **HTTP API**: 現在のレート取得（`GET /rate`）と購読登録（`POST /subscribe`）
//! - **通知ジョブ**: 毎日決まった時刻に購読者全員へレートをメールで送る
//!
//! ```text
//!                 ┌──────────────────────────────┐
//!  HTTP ────────→ │ handler ──→ RateSource ──────┼──→ Monobank API
//!                 │    └──────→ Subscribers ─────┼──→ SQLite
//!                 │                              │
//!  01:00 ───────→ │ scheduler → NotificationJob ─┼──→ SMTP
//!                 └──────────────────────────────┘
//! ```
//!
//! ## 環境変数
//!
//! | 変数名 | 必須 | 説明 |
//! |--------|------|------|
//! | `RATEWATCH_CONFIG` | No | 設定ファイルのパス（デフォルト: `config/local.yaml`） |
//! | `RATEWATCH__*` | No | 設定値の上書き（例: `RATEWATCH__SERVER__PORT=9000`） |
//! | `LOG_FORMAT` | No | `json` または `pretty`（デフォルト: `pretty`） |
//! | `RUST_LOG` | No | ログレベル（デフォルト: `info,ratewatch=debug`） |
//!
//! ## 起動方法
//!
//! ```bash
//! # 開発環境（メールは送信せずログに出す）
//! cargo run -p ratewatch-server
//!
//! # Mailpit に送信
//! RATEWATCH__EMAIL__BACKEND=smtp cargo run -p ratewatch-server
//! ```

use std::sync::Arc;

use anyhow::Context as _;
use ratewatch_domain::clock::SystemClock;
use ratewatch_infra::{
    MailTransport,
    MonobankRateSource,
    NoopMailTransport,
    SmtpMailTransport,
    SqliteSubscriberRepository,
    db,
};
use ratewatch_server::{
    app_builder::{AppDeps, build_router},
    config::{AppConfig, MailBackend},
    scheduler::Scheduler,
    usecase::NotificationJob,
};
use ratewatch_shared::observability::{TracingConfig, init_tracing};
use tokio::net::TcpListener;

/// RateWatch サーバーのエントリーポイント
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env ファイルを読み込む（存在する場合）
    dotenvy::dotenv().ok();

    // トレーシング初期化
    init_tracing(TracingConfig::from_env("ratewatch-server"));

    // 設定読み込み
    let config = AppConfig::load().context("設定の読み込みに失敗しました")?;

    tracing::info!(
        "RateWatch サーバーを起動します: {}",
        config.server.bind_address()
    );

    // データベース接続プールを作成し、マイグレーションを適用
    let pool = db::create_pool(&config.database.url)
        .await
        .context("データベース接続に失敗しました")?;
    db::run_migrations(&pool)
        .await
        .context("マイグレーションの適用に失敗しました")?;
    tracing::info!("データベースに接続しました");

    // 依存コンポーネントを初期化
    let rate_source = Arc::new(
        MonobankRateSource::new(&config.monobank.url, config.monobank.timeout())
            .context("Monobank クライアントの初期化に失敗しました")?,
    );
    let subscribers = Arc::new(SqliteSubscriberRepository::new(pool.clone()));
    let transport: Arc<dyn MailTransport> = match config.email.backend {
        MailBackend::Smtp => Arc::new(
            SmtpMailTransport::new(&config.email.smtp_settings())
                .context("SMTP クライアントの初期化に失敗しました")?,
        ),
        MailBackend::Noop => Arc::new(NoopMailTransport),
    };
    tracing::info!(backend = ?config.email.backend, "メール送信バックエンドを初期化しました");

    // 通知ジョブとスケジューラ
    let job = NotificationJob::new(
        rate_source.clone(),
        subscribers.clone(),
        transport,
        config.email.notification_settings()?,
    );
    let scheduler = Scheduler::new(
        Arc::new(job),
        config.schedule.daily_schedule()?,
        Arc::new(SystemClock),
    );
    tokio::spawn(scheduler.run_forever());

    // ルーター構築
    let app = build_router(AppDeps {
        rate_source,
        subscribers,
        pool,
    });

    // サーバー起動
    let addr = config.server.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("{addr} へのバインドに失敗しました"))?;
    tracing::info!("RateWatch サーバーが起動しました: {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
