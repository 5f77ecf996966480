//! # 通知送信
//!
//! メール通知の送信を担当するインフラストラクチャモジュール。
//!
//! ## 設計方針
//!
//! - **trait による抽象化**: `MailTransport` trait でバッチ送信を抽象化し、
//!   通知ジョブは lettre に直接依存しない
//! - **2 つの実装**: SMTP（lettre）、Noop（ログ出力のみ）
//! - **設定で切替**: `email.backend` でランタイム選択
//! - **空バッチは no-op**: どの実装も空のバッチを受け取ったら何もせず成功を返す

mod noop;
mod smtp;

use async_trait::async_trait;
pub use noop::NoopMailTransport;
use ratewatch_domain::notification::{EmailMessage, NotificationError};
pub use smtp::{SmtpMailTransport, SmtpSettings, SmtpTls};

/// メール送信トレイト
///
/// 1 回のジョブ実行で生成したメッセージをまとめて受け取る。
/// リトライや宛先ごとの送信記録は行わない。
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// バッチ内の全メッセージを送信する
    ///
    /// 一部の宛先で失敗した場合も残りの送信を試み、
    /// 失敗をまとめて 1 つの `SendFailed` で返す。
    async fn send(&self, batch: &[EmailMessage]) -> Result<(), NotificationError>;
}
