//! # ユースケース層
//!
//! RateWatch サーバーのビジネスロジックを実装する。
//!
//! ## 設計方針
//!
//! - **依存性注入**: 取得元・リポジトリ・送信手段を `Arc<dyn Trait>` で外部から注入
//! - **薄いハンドラ**: HTTP ハンドラは infra の trait を直接呼ぶ。複数ステップに
//!   またがる処理（通知ジョブ）だけをユースケースとして切り出す
//!
//! ## モジュール構成
//!
//! - `notification`: 日次通知ジョブとテンプレートレンダリング

pub mod notification;

pub use notification::{
    AbortReason,
    NotificationJob,
    NotificationSettings,
    RunOutcome,
    TemplateRenderer,
};
