//! # 通知ユースケース
//!
//! 為替レートを購読者全員にメールで通知する。
//!
//! - [`job`] - 1 回分の通知ジョブ
//! - [`template_renderer`] - 件名・本文のレンダリング

pub mod job;
pub mod template_renderer;

pub use job::{AbortReason, NotificationJob, NotificationSettings, RunOutcome};
pub use template_renderer::{RenderedMessage, TemplateRenderer};
