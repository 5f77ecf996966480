//! # 購読ハンドラ
//!
//! ## エンドポイント
//!
//! - `POST /subscribe` - メールアドレスを購読者として登録（フォーム `email`）
//!
//! ## レスポンス
//!
//! | ステータス | 条件 |
//! |-----------|------|
//! | 200 | 登録成功（ボディなし） |
//! | 400 | フォームを解釈できない（Content-Type 不一致、`email` 欠落） |
//! | 409 | 既に購読済み（大文字小文字を区別しない） |
//! | 500 | 永続化エラー |
//!
//! メールアドレスの形式は検証しない。

use std::sync::Arc;

use axum::{
    Form,
    extract::{State, rejection::FormRejection},
    http::StatusCode,
};
use ratewatch_infra::SubscriberRepository;
use ratewatch_shared::{event_log::event, log_business_event};
use serde::Deserialize;

use crate::error::ApiError;

/// 購読 API の共有状態
pub struct SubscriptionState {
    pub subscribers: Arc<dyn SubscriberRepository>,
}

/// 購読フォーム
#[derive(Debug, Deserialize)]
pub struct SubscribeForm {
    pub email: String,
}

/// POST /subscribe
pub async fn subscribe(
    State(state): State<Arc<SubscriptionState>>,
    form: Result<Form<SubscribeForm>, FormRejection>,
) -> Result<StatusCode, ApiError> {
    let Form(form) = form.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

    match state.subscribers.save_email(&form.email).await {
        Ok(()) => {
            log_business_event!(
                event.category = event::category::SUBSCRIPTION,
                event.action = event::action::SUBSCRIBED,
                event.result = event::result::SUCCESS,
                "購読を登録"
            );
            Ok(StatusCode::OK)
        }
        Err(e) if e.is_conflict() => {
            log_business_event!(
                event.category = event::category::SUBSCRIPTION,
                event.action = event::action::ALREADY_SUBSCRIBED,
                event.result = event::result::FAILURE,
                "既に購読済み"
            );
            Err(ApiError::AlreadySubscribed(form.email))
        }
        Err(e) => Err(ApiError::Database(e)),
    }
}
