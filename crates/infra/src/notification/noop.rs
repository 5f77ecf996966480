//! Noop メール送信実装
//!
//! メールを実際に送信せず、ログ出力のみ行う。
//! 開発環境や通知無効化時に使用する。

use async_trait::async_trait;
use ratewatch_domain::notification::{EmailMessage, NotificationError};

use super::MailTransport;

/// Noop メール送信（ログ出力のみ）
#[derive(Debug, Clone, Default)]
pub struct NoopMailTransport;

#[async_trait]
impl MailTransport for NoopMailTransport {
    async fn send(&self, batch: &[EmailMessage]) -> Result<(), NotificationError> {
        for email in batch {
            tracing::info!(
                to = %email.to,
                envelope_from = %email.envelope_from,
                subject = %email.subject,
                "Noop: メール送信をスキップ"
            );
        }
        tracing::debug!(count = batch.len(), "Noop: バッチ送信をスキップ");
        Ok(())
    }
}
