//! # SubscriberRepository
//!
//! 購読者メールアドレスの永続化を担当するリポジトリ。
//!
//! ## 設計方針
//!
//! - **一意性はストレージで保証**: 事前の存在チェックは行わず、一意制約違反を
//!   [`InfraError::conflict`] に変換する。同時リクエストでも重複は 1 件に収束する
//! - **大文字小文字を区別しない**: `email` 列は `COLLATE NOCASE`。保存時の表記は保持する
//! - **形式チェックなし**: 受け取った文字列をそのまま保存する
//! - **一覧は挿入順**: 自動採番の `id` 昇順で返す

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::error::InfraError;

/// 購読者リポジトリトレイト
#[async_trait]
pub trait SubscriberRepository: Send + Sync {
    /// メールアドレスを保存する
    ///
    /// 既に同じアドレス（大文字小文字を区別しない）が存在する場合は
    /// `Conflict` を返し、ストレージは変更しない。
    async fn save_email(&self, email: &str) -> Result<(), InfraError>;

    /// 保存済みの全メールアドレスを挿入順に返す
    async fn list_emails(&self) -> Result<Vec<String>, InfraError>;
}

/// SQLite 実装の SubscriberRepository
#[derive(Debug, Clone)]
pub struct SqliteSubscriberRepository {
    pool: SqlitePool,
}

impl SqliteSubscriberRepository {
    /// 新しいリポジトリインスタンスを作成
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriberRepository for SqliteSubscriberRepository {
    #[tracing::instrument(skip_all, level = "debug")]
    async fn save_email(&self, email: &str) -> Result<(), InfraError> {
        let result = sqlx::query("INSERT INTO subscribers (email) VALUES (?)")
            .bind(email)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e)
                if e.as_database_error()
                    .is_some_and(|db_err| db_err.is_unique_violation()) =>
            {
                Err(InfraError::conflict("Subscriber", email))
            }
            Err(e) => Err(e.into()),
        }
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn list_emails(&self) -> Result<Vec<String>, InfraError> {
        let emails = sqlx::query_scalar::<_, String>("SELECT email FROM subscribers ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(emails)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn トレイトはsendとsyncを実装している() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SqliteSubscriberRepository>();
    }
}
