//! # リポジトリ実装
//!
//! 永続化を担当するリポジトリトレイトとその具体的な実装を提供する。
//!
//! ## 設計方針
//!
//! - **データベース抽象化**: sqlx を使用し、SQLite 固有の処理をカプセル化
//! - **テスタビリティ**: トレイト経由でモック可能な設計

pub mod subscriber_repository;

pub use subscriber_repository::{SqliteSubscriberRepository, SubscriberRepository};
