//! # 為替レートハンドラ
//!
//! ## エンドポイント
//!
//! - `GET /rate` - USD → UAH の最新レート
//!
//! ## レスポンス例
//!
//! ```json
//! {
//!   "currencyCodeA": 840,
//!   "currencyCodeB": 980,
//!   "date": 1714521600,
//!   "rateSell": 39.7006,
//!   "rateBuy": 39.25
//! }
//! ```
//!
//! 取得元が返さなかった数値フィールドは省略する。

use std::sync::Arc;

use axum::{Json, extract::State};
use ratewatch_domain::currency::{CurrencyPair, CurrencyRate};
use ratewatch_infra::RateSource;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::ApiError;

/// 為替レート API の共有状態
pub struct RateState {
    pub rate_source: Arc<dyn RateSource>,
}

/// 為替レートレスポンス
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateResponse {
    pub currency_code_a: u16,
    pub currency_code_b: u16,
    /// UNIX 秒
    pub date:            i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_sell:       Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_buy:        Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_cross:      Option<Decimal>,
}

impl From<CurrencyRate> for RateResponse {
    fn from(rate: CurrencyRate) -> Self {
        Self {
            currency_code_a: rate.pair.base.as_u16(),
            currency_code_b: rate.pair.quote.as_u16(),
            date:            rate.timestamp(),
            rate_sell:       rate.rate_sell,
            rate_buy:        rate.rate_buy,
            rate_cross:      rate.rate_cross,
        }
    }
}

/// GET /rate
///
/// リクエストのたびに取得元へ問い合わせる。
pub async fn get_rate(State(state): State<Arc<RateState>>) -> Result<Json<RateResponse>, ApiError> {
    let rate = state.rate_source.fetch_rate(CurrencyPair::USD_UAH).await?;

    Ok(Json(rate.into()))
}
