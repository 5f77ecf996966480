//! # RateWatch ドメイン層
//!
//! 為替レート通知の中核となる値オブジェクトとエラーを定義する。
//!
//! ## 依存関係の方向
//!
//! ```text
//! server → infra → domain
//!    ↘       ↓
//!      shared
//! ```
//!
//! ドメイン層は DB・HTTP・SMTP など外部システムに一切依存しない。
//!
//! ## モジュール構成
//!
//! - [`currency`] - 通貨コード・通貨ペア・為替レート
//! - [`notification`] - 通知メール・通知エラー・エンベロープ送信者
//! - [`clock`] - 時刻プロバイダ
//! - [`error`] - ドメイン層で発生するエラーの定義

#[macro_use]
mod macros;

pub mod clock;
pub mod currency;
pub mod error;
pub mod notification;

pub use error::DomainError;
