//! # 通知ジョブ
//!
//! 為替レート取得 → 購読者一覧取得 → テンプレートレンダリング → バッチ送信 を
//! 1 回分実行する。
//!
//! ## 設計方針
//!
//! - **fire-and-forget**: `run()` はエラーを返さない。失敗はすべてログに残す
//! - **fail-closed**: レートまたは購読者一覧が取得できなければ 1 通も送らない
//! - **テンプレートは実行ごとにコンパイル**: 構文エラーは実行全体を中止する。
//!   特定の宛先でのみ失敗するレンダリングはその宛先をスキップする
//! - **空のバッチも送信に回す**: 送信手段側で no-op として扱う
//! - **リトライしない**: 送信失敗はログに残すのみ
//! - **依存性注入**: 取得元、リポジトリ、送信手段は trait で抽象化

use std::sync::Arc;

use async_trait::async_trait;
use ratewatch_domain::{
    currency::CurrencyPair,
    notification::{
        EmailMessage,
        EnvelopeFromTemplate,
        NotificationBatch,
        NotificationError,
        NotificationRunId,
    },
};
use ratewatch_infra::{InfraError, MailTransport, RateSource, RateSourceError, SubscriberRepository};
use ratewatch_shared::{
    event_log::{error, event},
    log_business_event,
};
use rand::Rng;
use tracing::Instrument;

use super::TemplateRenderer;
use crate::scheduler::ScheduledJob;

/// メッセージ生成に使う設定
#[derive(Debug, Clone)]
pub struct NotificationSettings {
    /// `From` ヘッダー
    pub from:             String,
    /// エンベロープ送信者のフォーマット
    pub envelope_from:    EnvelopeFromTemplate,
    /// 件名テンプレート
    pub subject:          String,
    /// 本文テンプレート
    pub message_template: String,
}

/// 実行を中止した理由
#[derive(Debug)]
pub enum AbortReason {
    /// 為替レートを取得できなかった
    RateSource(RateSourceError),
    /// 購読者一覧を取得できなかった
    SubscriberStore(InfraError),
    /// テンプレートをコンパイルできなかった
    Template(NotificationError),
    /// バッチの送信に失敗した
    Transport(NotificationError),
}

impl AbortReason {
    /// 中止したステップ名
    pub fn stage(&self) -> &'static str {
        match self {
            AbortReason::RateSource(_) => "rate_source",
            AbortReason::SubscriberStore(_) => "subscriber_store",
            AbortReason::Template(_) => "template",
            AbortReason::Transport(_) => "transport",
        }
    }
}

/// 1 回の実行結果
#[derive(Debug)]
pub enum RunOutcome {
    /// バッチを送信した
    Delivered {
        /// 送信したメッセージ数
        sent:    usize,
        /// レンダリングに失敗してスキップした購読者数
        skipped: usize,
    },
    /// 途中で中止した
    Aborted(AbortReason),
}

/// 通知ジョブ
pub struct NotificationJob {
    rate_source: Arc<dyn RateSource>,
    subscribers: Arc<dyn SubscriberRepository>,
    transport:   Arc<dyn MailTransport>,
    settings:    NotificationSettings,
}

impl NotificationJob {
    pub fn new(
        rate_source: Arc<dyn RateSource>,
        subscribers: Arc<dyn SubscriberRepository>,
        transport: Arc<dyn MailTransport>,
        settings: NotificationSettings,
    ) -> Self {
        Self {
            rate_source,
            subscribers,
            transport,
            settings,
        }
    }

    /// ジョブを 1 回実行する（fire-and-forget）
    ///
    /// 実行ごとに `notification_job` スパンを作り、`run_id` で全ログを関連付ける。
    /// エラー内容は失敗したステップがログに出すため、ここでは中止したステップ名だけを残す。
    pub async fn run(&self) {
        let run_id = NotificationRunId::new();
        let span = tracing::info_span!("notification_job", %run_id);

        async {
            tracing::info!("通知ジョブを開始");

            if let RunOutcome::Aborted(reason) = self.execute().await {
                log_business_event!(
                    event.category = event::category::NOTIFICATION,
                    event.action = event::action::RUN_ABORTED,
                    event.result = event::result::FAILURE,
                    notification.stage = reason.stage(),
                    "通知ジョブを中止"
                );
            }
        }
        .instrument(span)
        .await;
    }

    /// ジョブを 1 回実行し、どの分岐を通ったかを返す
    pub async fn execute(&self) -> RunOutcome {
        let rate = match self.rate_source.fetch_rate(CurrencyPair::USD_UAH).await {
            Ok(rate) => rate,
            Err(e) => {
                tracing::error!(
                    error.category = error::category::EXTERNAL_SERVICE,
                    error.kind = error::kind::RATE_SOURCE,
                    "為替レートの取得に失敗: {}",
                    e
                );
                return RunOutcome::Aborted(AbortReason::RateSource(e));
            }
        };

        let emails = match self.subscribers.list_emails().await {
            Ok(emails) => emails,
            Err(e) => {
                tracing::error!(
                    error.category = error::category::INFRASTRUCTURE,
                    error.kind = error::kind::DATABASE,
                    span_trace = %e.span_trace(),
                    "購読者一覧の取得に失敗: {}",
                    e
                );
                return RunOutcome::Aborted(AbortReason::SubscriberStore(e));
            }
        };

        let renderer = match TemplateRenderer::compile(
            &self.settings.subject,
            &self.settings.message_template,
        ) {
            Ok(renderer) => renderer,
            Err(e) => {
                tracing::error!(
                    error.category = error::category::CONFIGURATION,
                    error.kind = error::kind::TEMPLATE,
                    "メッセージテンプレートのコンパイルに失敗: {}",
                    e
                );
                return RunOutcome::Aborted(AbortReason::Template(e));
            }
        };

        let mut batch: NotificationBatch = Vec::with_capacity(emails.len());
        let mut skipped = 0;

        for email in emails {
            match renderer.render(&rate, &email) {
                Ok(rendered) => batch.push(EmailMessage {
                    to:            email,
                    from:          self.settings.from.clone(),
                    envelope_from: self.settings.envelope_from.render(&random_token()),
                    subject:       rendered.subject,
                    text_body:     rendered.text_body,
                }),
                Err(e) => {
                    tracing::warn!(
                        error.category = error::category::CONFIGURATION,
                        error.kind = error::kind::TEMPLATE,
                        to = %email,
                        "メッセージのレンダリングに失敗したためスキップ: {}",
                        e
                    );
                    skipped += 1;
                }
            }
        }

        let sent = batch.len();

        match self.transport.send(&batch).await {
            Ok(()) => {
                log_business_event!(
                    event.category = event::category::NOTIFICATION,
                    event.action = event::action::BATCH_SENT,
                    event.result = event::result::SUCCESS,
                    notification.sent = sent,
                    notification.skipped = skipped,
                    notification.rate_date = %rate.formatted_date(),
                    "通知メールを送信"
                );
                RunOutcome::Delivered { sent, skipped }
            }
            Err(e) => {
                log_business_event!(
                    event.category = event::category::NOTIFICATION,
                    event.action = event::action::BATCH_FAILED,
                    event.result = event::result::FAILURE,
                    error.category = error::category::EXTERNAL_SERVICE,
                    error.kind = error::kind::MAIL_TRANSPORT,
                    notification.attempted = sent,
                    "通知メールの送信に失敗: {}",
                    e
                );
                RunOutcome::Aborted(AbortReason::Transport(e))
            }
        }
    }
}

#[async_trait]
impl ScheduledJob for NotificationJob {
    async fn run(&self) {
        NotificationJob::run(self).await;
    }
}

/// エンベロープ送信者に埋め込むランダムトークン（16 桁の 16 進数）
fn random_token() -> String {
    format!("{:016x}", rand::rng().random::<u64>())
}
