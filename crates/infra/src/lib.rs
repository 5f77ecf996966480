//! # RateWatch インフラ層
//!
//! 外部システムとの接続・通信を担当するインフラストラクチャ層。
//!
//! ## 設計方針
//!
//! 外部システムの詳細をトレイトの背後にカプセル化し、通知ジョブや
//! HTTP ハンドラーがモックに差し替えられるようにする。
//!
//! ## 責務
//!
//! - **データベース接続**: SQLite への接続プール管理とマイグレーション
//! - **リポジトリ実装**: 購読者の永続化
//! - **外部 API クライアント**: Monobank からの為替レート取得
//! - **メール送信**: SMTP（lettre）と Noop
//!
//! ## 依存関係
//!
//! ```text
//! server → infra → domain
//!    ↘                ↑
//!      ───────────────┘
//! ```
//!
//! ## モジュール構成
//!
//! - [`db`] - SQLite データベース接続管理
//! - [`error`] - インフラ層エラー定義
//! - [`repository`] - リポジトリ実装
//! - [`rate_source`] - 為替レート取得
//! - [`notification`] - メール送信

pub mod db;
pub mod error;
#[cfg(feature = "test-utils")]
pub mod mock;
pub mod notification;
pub mod rate_source;
pub mod repository;

pub use error::{InfraError, InfraErrorKind};
pub use notification::{MailTransport, NoopMailTransport, SmtpMailTransport, SmtpSettings, SmtpTls};
pub use rate_source::{MonobankRateSource, RateSource, RateSourceError};
pub use repository::{SqliteSubscriberRepository, SubscriberRepository};
