//! # HTTP リクエストハンドラ
//!
//! axum のルートに対応するハンドラ関数を定義する。
//!
//! ## 設計方針
//!
//! - 各ハンドラはサブモジュールに配置
//! - 親モジュール（この `handler.rs`）で re-export し、フラットな API を提供
//! - ハンドラは薄く保ち、取得や保存は infra 層のトレイトに委譲

pub mod health;
pub mod rate;
pub mod subscription;

pub use health::{ReadinessState, health_check, readiness_check};
pub use rate::{RateResponse, RateState, get_rate};
pub use subscription::{SubscribeForm, SubscriptionState, subscribe};
