//! # RateWatch サーバーライブラリ
//!
//! USD/UAH の為替レートを配信し、購読者へ毎日メールで通知するサーバーのコアモジュール。
//!
//! ## モジュール構成
//!
//! - `app_builder`: ルーター構築
//! - `config`: YAML / 環境変数からの設定読み込み
//! - `error`: API エラーと HTTP レスポンスへの変換
//! - `handler`: HTTP ハンドラ
//! - `scheduler`: 通知ジョブの日次起動
//! - `usecase`: 通知ジョブ

pub mod app_builder;
pub mod config;
pub mod error;
pub mod handler;
pub mod scheduler;
pub mod usecase;
