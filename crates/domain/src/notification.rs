//! # 通知
//!
//! 為替レート通知メールに関するドメインモデルを定義する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 備考 |
//! |---|------------|------|
//! | [`EmailMessage`] | 通知メール | 購読者 1 人分のレンダリング済みメッセージ |
//! | [`NotificationBatch`] | バッチ | 1 回のジョブ実行で生成したメッセージの集合。永続化しない |
//! | [`EnvelopeFromTemplate`] | エンベロープ送信者 | バウンス処理用の `MAIL FROM`。メッセージごとにランダムなトークンを埋め込む |
//!
//! ## 設計方針
//!
//! - **fire-and-forget**: 通知ジョブは失敗をログに残すのみで、呼び出し元へ返さない
//! - **送信手段の抽象化**: メッセージ構造はここで定義し、送信は infra 層の trait に委ねる

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::DomainError;

define_uuid_id! {
    /// 通知ジョブの実行 ID
    ///
    /// 1 回のジョブ実行で出力されるログを関連付けるために使用する。
    pub struct NotificationRunId;
}

/// 通知送信エラー
#[derive(Debug, Error)]
pub enum NotificationError {
    /// メール送信に失敗
    #[error("メール送信に失敗: {0}")]
    SendFailed(String),

    /// テンプレートのパースまたはレンダリングに失敗
    #[error("テンプレートレンダリングに失敗: {0}")]
    TemplateFailed(String),

    /// メールアドレスとして解釈できない
    #[error("メールアドレスが不正: {0}")]
    InvalidAddress(String),
}

/// 通知メール
///
/// テンプレートレンダリングの出力。`MailTransport` に渡される。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    /// 送信先メールアドレス
    pub to:            String,
    /// `From` ヘッダーに表示する送信元
    pub from:          String,
    /// SMTP エンベロープの送信元（`MAIL FROM`）
    pub envelope_from: String,
    /// 件名
    pub subject:       String,
    /// プレーンテキスト本文
    pub text_body:     String,
}

/// 1 回のジョブ実行で送信するメッセージの集合
pub type NotificationBatch = Vec<EmailMessage>;

/// エンベロープ送信者のフォーマット
///
/// `bounce+{token}@example.com` のように `{token}` プレースホルダを 1 つ以上含む。
/// メッセージごとに異なるトークンを埋め込み、受信側サーバーでのスレッド化や
/// バウンス追跡の衝突を避ける。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EnvelopeFromTemplate(String);

impl EnvelopeFromTemplate {
    /// トークンのプレースホルダ
    pub const PLACEHOLDER: &'static str = "{token}";

    /// フォーマット文字列を検証して作成する
    ///
    /// # バリデーション
    ///
    /// - `{token}` を含む
    /// - `@` を含む
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();

        if !value.contains(Self::PLACEHOLDER) {
            return Err(DomainError::Validation(format!(
                "エンベロープ送信者に {} が含まれていません: {value}",
                Self::PLACEHOLDER
            )));
        }

        if !value.contains('@') {
            return Err(DomainError::Validation(format!(
                "エンベロープ送信者の形式が不正です: {value}"
            )));
        }

        Ok(Self(value))
    }

    /// トークンを埋め込んだアドレスを返す
    pub fn render(&self, token: &str) -> String {
        self.0.replace(Self::PLACEHOLDER, token)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for EnvelopeFromTemplate {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EnvelopeFromTemplate> for String {
    fn from(value: EnvelopeFromTemplate) -> Self {
        value.0
    }
}
