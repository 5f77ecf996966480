//! テスト共通フィクスチャ
//!
//! DB を使用する統合テストで共通利用するヘルパー。 Rust の統合テスト規約に従い
//! `tests/common/mod.rs` に配置。

// 各テストファイルが独立したクレートとしてコンパイルされるため、
// 使用しない関数に dead_code 警告が出る。モジュール全体で抑制する。
#![allow(dead_code)]

use std::path::Path;

use ratewatch_infra::db;
use sqlx::SqlitePool;

/// マイグレーション適用済みのインメモリ DB を作成する
pub async fn setup_pool() -> SqlitePool {
    let pool = db::create_in_memory_pool()
        .await
        .expect("インメモリ DB の作成に失敗");
    db::run_migrations(&pool)
        .await
        .expect("マイグレーションに失敗");
    pool
}

/// マイグレーション適用済みのファイル DB を作成する
///
/// `db::create_pool` を通すため、本番と同じく複数接続・WAL で動く。
pub async fn setup_file_pool(path: &Path) -> SqlitePool {
    let url = format!("sqlite://{}?mode=rwc", path.display());
    let pool = db::create_pool(&url)
        .await
        .expect("ファイル DB の作成に失敗");
    db::run_migrations(&pool)
        .await
        .expect("マイグレーションに失敗");
    pool
}

/// 購読者テーブルの件数
pub async fn count_subscribers(pool: &SqlitePool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM subscribers")
        .fetch_one(pool)
        .await
        .expect("件数の取得に失敗")
}
