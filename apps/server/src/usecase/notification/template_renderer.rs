//! # テンプレートレンダラー
//!
//! tera テンプレートエンジンで通知メールの件名と本文を生成する。
//!
//! ## 設計方針
//!
//! - **設定からテンプレートを読む**: 件名と本文は設定値の文字列をそのまま tera に登録する
//! - **実行ごとにコンパイル**: 通知ジョブの実行ごとに [`TemplateRenderer::compile`] を呼ぶ。
//!   構文エラーはその実行全体の失敗になる
//! - **プレーンテキスト**: テンプレート名に拡張子を付けないため自動エスケープは働かない
//!
//! ## テンプレート変数
//!
//! | 変数 | 内容 |
//! |------|------|
//! | `base_currency` | 基準通貨（例: `USD`） |
//! | `quote_currency` | 相手通貨（例: `UAH`） |
//! | `date` | レートの基準日時（RFC 3339, UTC） |
//! | `rate_sell` / `rate_buy` / `rate_cross` | 各レート。取得元が返さなかった場合は null |
//! | `email` | 宛先メールアドレス |

use ratewatch_domain::{currency::CurrencyRate, notification::NotificationError};
use tera::{Context, Tera};

const SUBJECT_TEMPLATE: &str = "subject";
const BODY_TEMPLATE: &str = "body";

/// レンダリング結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub subject:   String,
    pub text_body: String,
}

/// テンプレートレンダラー
pub struct TemplateRenderer {
    engine: Tera,
}

impl TemplateRenderer {
    /// 件名と本文のテンプレートをコンパイルする
    pub fn compile(subject: &str, body: &str) -> Result<Self, NotificationError> {
        let mut engine = Tera::default();

        engine
            .add_raw_templates(vec![(SUBJECT_TEMPLATE, subject), (BODY_TEMPLATE, body)])
            .map_err(|e| NotificationError::TemplateFailed(describe(&e)))?;

        Ok(Self { engine })
    }

    /// 宛先 1 件分の件名と本文を生成する
    pub fn render(
        &self,
        rate: &CurrencyRate,
        email: &str,
    ) -> Result<RenderedMessage, NotificationError> {
        let context = build_context(rate, email);

        let subject = self
            .engine
            .render(SUBJECT_TEMPLATE, &context)
            .map_err(|e| NotificationError::TemplateFailed(describe(&e)))?;

        let text_body = self
            .engine
            .render(BODY_TEMPLATE, &context)
            .map_err(|e| NotificationError::TemplateFailed(describe(&e)))?;

        Ok(RenderedMessage {
            subject: subject.trim().to_string(),
            text_body,
        })
    }
}

fn build_context(rate: &CurrencyRate, email: &str) -> Context {
    let mut context = Context::new();
    context.insert("base_currency", &rate.pair.base.to_string());
    context.insert("quote_currency", &rate.pair.quote.to_string());
    context.insert("date", &rate.formatted_date());
    context.insert("rate_sell", &rate.rate_sell);
    context.insert("rate_buy", &rate.rate_buy);
    context.insert("rate_cross", &rate.rate_cross);
    context.insert("email", email);
    context
}

/// tera のエラーは原因がネストしているため、source を連結して 1 行にする
fn describe(error: &tera::Error) -> String {
    let mut message = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
