//! # SQLite データベース接続管理
//!
//! データベース接続プールの作成とマイグレーションを行う。
//!
//! ## 設計方針
//!
//! - **接続プール**: 毎回接続を張り直すオーバーヘッドを避け、接続を再利用
//! - **sqlx 採用**: 非同期サポート、マイグレーションの埋め込み
//! - **SQLite**: 購読者リストのみを保持する単一ファイル DB
//!
//! ## 使用例
//!
//! ```rust,ignore
//! use ratewatch_infra::db;
//!
//! async fn example() -> Result<(), ratewatch_infra::InfraError> {
//!     let pool = db::create_pool("sqlite://storage.db?mode=rwc").await?;
//!     db::run_migrations(&pool).await?;
//!     Ok(())
//! }
//! ```

use std::{str::FromStr, time::Duration};

use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
};

use crate::error::InfraError;

/// インメモリ DB の接続 URL
pub const IN_MEMORY_URL: &str = "sqlite::memory:";

/// データベースマイグレーションを実行する
///
/// `sqlx::migrate!()` マクロで埋め込まれたマイグレーションファイルを
/// 順番に適用する。適用済みのマイグレーションはスキップされる。
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), InfraError> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    Ok(())
}

/// SQLite 接続プールを作成する
///
/// アプリケーション起動時に一度だけ呼び出し、作成したプールを
/// アプリケーション全体で共有する。
///
/// `sqlite::memory:` が渡された場合は [`create_in_memory_pool`] に委譲する。
///
/// # 設定値
///
/// - `max_connections(5)`: SQLite は書き込みが直列化されるため少なめ
/// - `acquire_timeout(5秒)`: 接続取得のタイムアウト
/// - `busy_timeout(5秒)`: 書き込みロック待ち
/// - WAL モード: 読み取りと書き込みを並行させる
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, InfraError> {
    if database_url == IN_MEMORY_URL {
        return create_in_memory_pool().await;
    }

    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(5))
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// インメモリ SQLite の接続プールを作成する
///
/// インメモリ DB は接続ごとに別の DB になるため、接続を 1 本に固定し
/// アイドルタイムアウトと寿命を無効化して DB が消えないようにする。
pub async fn create_in_memory_pool() -> Result<SqlitePool, InfraError> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect(IN_MEMORY_URL)
        .await?;

    Ok(pool)
}

/// DB への疎通を確認する（Readiness Check 用）
pub async fn ping(pool: &SqlitePool) -> Result<(), InfraError> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_インメモリdbにマイグレーションを適用できる() {
        let pool = create_in_memory_pool().await.unwrap();

        run_migrations(&pool).await.unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM subscribers")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_マイグレーションは再実行しても成功する() {
        let pool = create_in_memory_pool().await.unwrap();

        run_migrations(&pool).await.unwrap();
        run_migrations(&pool).await.unwrap();
    }

    #[tokio::test]
    async fn test_create_poolはメモリurlを受け付ける() {
        let pool = create_pool(IN_MEMORY_URL).await.unwrap();

        ping(&pool).await.unwrap();
    }
}
