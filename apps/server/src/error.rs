//! # API エラー定義
//!
//! ハンドラーで発生するエラーと、HTTP レスポンスへの変換を定義する。
//!
//! エラーログはここ（レスポンスへの変換時）で 1 回だけ出力する。

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use ratewatch_infra::{InfraError, RateSourceError};
use ratewatch_shared::{ErrorResponse, event_log::error};
use thiserror::Error;

/// API で発生するエラー
#[derive(Debug, Error)]
pub enum ApiError {
    /// リクエストを解釈できない
    #[error("不正なリクエスト: {0}")]
    BadRequest(String),

    /// 既に購読済み
    #[error("既に購読済みです: {0}")]
    AlreadySubscribed(String),

    /// 為替レートの取得に失敗
    #[error("為替レートの取得に失敗: {0}")]
    RateSource(#[from] RateSourceError),

    /// 永続化エラー
    #[error("データベースエラー: {0}")]
    Database(#[from] InfraError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ErrorResponse::bad_request(msg)),
            ApiError::AlreadySubscribed(_) => (
                StatusCode::CONFLICT,
                ErrorResponse::conflict("このメールアドレスは既に購読済みです"),
            ),
            ApiError::RateSource(e) => {
                tracing::error!(
                    error.category = error::category::EXTERNAL_SERVICE,
                    error.kind = error::kind::RATE_SOURCE,
                    "為替レートの取得に失敗: {}",
                    e
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::upstream_error("為替レートを取得できませんでした"),
                )
            }
            ApiError::Database(e) => {
                tracing::error!(
                    error.category = error::category::INFRASTRUCTURE,
                    error.kind = error::kind::DATABASE,
                    span_trace = %e.span_trace(),
                    "データベースエラー: {}",
                    e
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::internal_error(),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
