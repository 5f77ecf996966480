//! SMTP メール送信実装
//!
//! lettre の `AsyncSmtpTransport` を使用してメールを送信する。
//! 開発環境では Mailpit（ローカル SMTP サーバー）に接続する。
//!
//! 各メッセージには以下を付与する:
//!
//! - `Precedence: bulk` ヘッダー（自動応答の抑止）
//! - `Message-ID` と `Date` ヘッダー
//! - `From` ヘッダーとは別のエンベロープ送信者（`MAIL FROM`）
//!
//! ## タイムアウトと接続障害
//!
//! lettre のタイムアウトは TCP 接続にしか効かないため、1 通ごとの送信全体を
//! `tokio::time::timeout` で区切る。タイムアウトや接続障害（SMTP 応答コードを
//! 伴わない失敗）が起きた時点でバッチの残りは送信せず、未送信として失敗に数える。
//! 接続は `pool` feature で 1 回のバッチ内で使い回す。

use std::time::Duration;

use async_trait::async_trait;
use lettre::{
    Address,
    AsyncSmtpTransport,
    AsyncTransport,
    Message,
    Tokio1Executor,
    address::Envelope,
    message::{
        Mailbox,
        header::{ContentType, Header, HeaderName, HeaderValue},
    },
    transport::smtp::authentication::Credentials,
};
use ratewatch_domain::notification::{EmailMessage, NotificationError};
use serde::Deserialize;

use super::MailTransport;

/// SMTP 接続の TLS モード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmtpTls {
    /// 平文（Mailpit 等のローカル SMTP 向け）
    #[default]
    None,
    /// 平文で接続後に STARTTLS で昇格
    StartTls,
    /// 接続時から TLS
    Tls,
}

/// SMTP 接続設定
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host:     String,
    pub port:     u16,
    pub tls:      SmtpTls,
    /// ユーザー名とパスワード。`None` の場合は認証しない
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout:  Duration,
}

/// `Precedence: bulk` ヘッダー
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PrecedenceBulk;

impl Header for PrecedenceBulk {
    fn name() -> HeaderName {
        HeaderName::new_from_ascii_str("Precedence")
    }

    fn parse(s: &str) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        if s.trim().eq_ignore_ascii_case("bulk") {
            Ok(Self)
        } else {
            Err(format!("Precedence ヘッダーの値が不正: {s}").into())
        }
    }

    fn display(&self) -> HeaderValue {
        HeaderValue::new(Self::name(), "bulk".to_string())
    }
}

/// SMTP メール送信
///
/// `lettre::AsyncSmtpTransport<Tokio1Executor>` をラップする。
pub struct SmtpMailTransport {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    timeout:   Duration,
}

impl SmtpMailTransport {
    /// 新しい SMTP 送信インスタンスを作成
    ///
    /// 接続は送信時に張るため、ここではサーバーに接続しない。
    pub fn new(settings: &SmtpSettings) -> Result<Self, NotificationError> {
        let builder = match settings.tls {
            // builder_dangerous: TLS なしで接続
            SmtpTls::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&settings.host),
            SmtpTls::StartTls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host).map_err(
                    |e| NotificationError::SendFailed(format!("STARTTLS 設定に失敗: {e}")),
                )?
            }
            SmtpTls::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)
                .map_err(|e| NotificationError::SendFailed(format!("TLS 設定に失敗: {e}")))?,
        };

        let mut builder = builder
            .port(settings.port)
            .timeout(Some(settings.timeout));

        if let (Some(username), Some(password)) = (&settings.username, &settings.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            timeout:   settings.timeout,
        })
    }
}

/// `EmailMessage` から送信用のメッセージを組み立てる
fn build_message(email: &EmailMessage) -> Result<Message, NotificationError> {
    let from: Mailbox = email.from.parse().map_err(|e| {
        NotificationError::InvalidAddress(format!("送信元アドレス不正 {}: {e}", email.from))
    })?;
    let to: Mailbox = email.to.parse().map_err(|e| {
        NotificationError::InvalidAddress(format!("宛先アドレス不正 {}: {e}", email.to))
    })?;
    let envelope_from: Address = email.envelope_from.parse().map_err(|e| {
        NotificationError::InvalidAddress(format!(
            "エンベロープ送信者不正 {}: {e}",
            email.envelope_from
        ))
    })?;

    let envelope = Envelope::new(Some(envelope_from), vec![to.email.clone()])
        .map_err(|e| NotificationError::SendFailed(format!("エンベロープ構築失敗: {e}")))?;

    Message::builder()
        .from(from)
        .to(to)
        .subject(email.subject.clone())
        .message_id(None)
        .date_now()
        .header(PrecedenceBulk)
        .header(ContentType::TEXT_PLAIN)
        .envelope(envelope)
        .body(email.text_body.clone())
        .map_err(|e| NotificationError::SendFailed(format!("メッセージ構築失敗: {e}")))
}

/// 1 通分の送信失敗
enum DeliveryFailure {
    /// このメッセージだけの失敗（不正なアドレス、SMTP の拒否応答）
    Message(NotificationError),
    /// サーバーに届かない。後続のメッセージも送れない
    Connection(String),
}

impl SmtpMailTransport {
    async fn deliver(&self, message: Message) -> Result<(), DeliveryFailure> {
        match tokio::time::timeout(self.timeout, self.transport.send(message)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) if e.status().is_some() => Err(DeliveryFailure::Message(
                NotificationError::SendFailed(format!("SMTP 送信失敗: {e}")),
            )),
            Ok(Err(e)) => Err(DeliveryFailure::Connection(format!("SMTP 接続失敗: {e}"))),
            Err(_) => Err(DeliveryFailure::Connection(format!(
                "SMTP 応答がタイムアウト（{:?}）",
                self.timeout
            ))),
        }
    }
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    #[tracing::instrument(skip_all, level = "debug", fields(count = batch.len()))]
    async fn send(&self, batch: &[EmailMessage]) -> Result<(), NotificationError> {
        if batch.is_empty() {
            tracing::debug!("送信対象がないため SMTP 接続を省略");
            return Ok(());
        }

        let mut failures = Vec::new();

        for (index, email) in batch.iter().enumerate() {
            let result = match build_message(email) {
                Ok(message) => self.deliver(message).await,
                Err(e) => Err(DeliveryFailure::Message(e)),
            };

            match result {
                Ok(()) => {}
                Err(DeliveryFailure::Message(e)) => failures.push(format!("{}: {e}", email.to)),
                Err(DeliveryFailure::Connection(reason)) => {
                    failures.push(format!("{}: {reason}", email.to));
                    failures.extend(
                        batch[index + 1..]
                            .iter()
                            .map(|rest| format!("{}: 未送信", rest.to)),
                    );
                    break;
                }
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(NotificationError::SendFailed(format!(
                "{}/{} 件の送信に失敗: {}",
                failures.len(),
                batch.len(),
                failures.join("; ")
            )))
        }
    }
}
