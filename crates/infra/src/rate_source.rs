//! # 為替レート取得元
//!
//! Monobank 公開 API（`GET /bank/currency`）から為替レートを取得する。
//!
//! ## 設計方針
//!
//! - **trait による抽象化**: `RateSource` trait でレート取得を抽象化し、
//!   ジョブやハンドラーのテストではモックに差し替える
//! - **キャッシュしない**: 呼び出しごとに API を叩く
//! - **値はそのまま**: 売値・買値・クロスレートは丸めず、欠損は欠損のまま返す
//! - **ゼロ埋めしない**: 対象ペアが含まれない応答は [`RateSourceError::NotFound`]
//!
//! ## エンドポイント
//!
//! - `GET {base_url}/bank/currency` - 全通貨ペアのレート一覧

use std::time::Duration;

use async_trait::async_trait;
use ratewatch_domain::currency::{CurrencyCode, CurrencyPair, CurrencyRate};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

/// レート取得エラー
#[derive(Debug, Clone, Error)]
pub enum RateSourceError {
    /// 応答に対象の通貨ペアが含まれていない
    #[error("通貨ペアが見つかりません: {pair}")]
    NotFound { pair: CurrencyPair },

    /// 通信失敗、2xx 以外のステータス、応答のパース失敗
    #[error("為替レート API エラー: {0}")]
    Upstream(String),
}

impl From<reqwest::Error> for RateSourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RateSourceError::Upstream(format!("タイムアウト: {err}"))
        } else {
            RateSourceError::Upstream(err.to_string())
        }
    }
}

/// 為替レート取得トレイト
#[async_trait]
pub trait RateSource: Send + Sync {
    /// 指定した通貨ペアの最新レートを取得する
    async fn fetch_rate(&self, pair: CurrencyPair) -> Result<CurrencyRate, RateSourceError>;
}

// --- レスポンス型 ---

/// `/bank/currency` の 1 要素
///
/// ペアによって `rateSell` / `rateBuy` か `rateCross` のどちらかが省略される。
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MonobankRate {
    currency_code_a: u16,
    currency_code_b: u16,
    date:            i64,
    #[serde(default)]
    rate_sell:       Option<Decimal>,
    #[serde(default)]
    rate_buy:        Option<Decimal>,
    #[serde(default)]
    rate_cross:      Option<Decimal>,
}

/// 応答から対象ペアの最初の要素を探す
fn find_rate(rates: Vec<MonobankRate>, pair: CurrencyPair) -> Result<CurrencyRate, RateSourceError> {
    let entry = rates
        .into_iter()
        .find(|r| {
            CurrencyCode::new(r.currency_code_a) == pair.base
                && CurrencyCode::new(r.currency_code_b) == pair.quote
        })
        .ok_or(RateSourceError::NotFound { pair })?;

    CurrencyRate::from_unix(
        pair,
        entry.date,
        entry.rate_sell,
        entry.rate_buy,
        entry.rate_cross,
    )
    .map_err(|e| RateSourceError::Upstream(e.to_string()))
}

/// Monobank API クライアント
#[derive(Debug, Clone)]
pub struct MonobankRateSource {
    base_url: String,
    client:   reqwest::Client,
}

impl MonobankRateSource {
    /// 新しい MonobankRateSource を作成する
    ///
    /// # 引数
    ///
    /// - `base_url`: API のベース URL（例: `https://api.monobank.ua`）
    /// - `timeout`: 1 リクエストあたりのタイムアウト
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RateSourceError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl RateSource for MonobankRateSource {
    #[tracing::instrument(skip_all, level = "debug", fields(%pair))]
    async fn fetch_rate(&self, pair: CurrencyPair) -> Result<CurrencyRate, RateSourceError> {
        let url = format!("{}/bank/currency", self.base_url);

        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RateSourceError::Upstream(format!(
                "予期しないステータス {status}: {body}"
            )));
        }

        let body = response.text().await?;
        let rates: Vec<MonobankRate> = serde_json::from_str(&body)
            .map_err(|e| RateSourceError::Upstream(format!("応答のパースに失敗: {e}")))?;

        find_rate(rates, pair)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn parse(json: &str) -> Vec<MonobankRate> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn トレイトはsendとsyncを実装している() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MonobankRateSource>();
    }

    #[test]
    fn test_対象ペアの値がそのまま返る() {
        let rates = parse(
            r#"[
                {"currencyCodeA":978,"currencyCodeB":980,"date":1714521000,"rateSell":43.1,"rateBuy":42.2},
                {"currencyCodeA":840,"currencyCodeB":980,"date":1714521600,"rateSell":39.7006,"rateBuy":39.25}
            ]"#,
        );

        let rate = find_rate(rates, CurrencyPair::USD_UAH).unwrap();

        assert_eq!(rate.pair, CurrencyPair::USD_UAH);
        assert_eq!(rate.timestamp(), 1_714_521_600);
        assert_eq!(rate.rate_sell, Some(dec!(39.7006)));
        assert_eq!(rate.rate_buy, Some(dec!(39.25)));
        assert_eq!(rate.rate_cross, None);
        assert_eq!(rate.formatted_date(), "2024-05-01T00:00:00Z");
    }

    #[test]
    fn test_逆向きのペアは一致しない() {
        let rates = parse(r#"[{"currencyCodeA":980,"currencyCodeB":840,"date":1,"rateCross":0.025}]"#);

        let result = find_rate(rates, CurrencyPair::USD_UAH);

        assert!(matches!(
            result,
            Err(RateSourceError::NotFound { pair }) if pair == CurrencyPair::USD_UAH
        ));
    }

    #[test]
    fn test_空の応答はnot_found() {
        let result = find_rate(Vec::new(), CurrencyPair::USD_UAH);

        assert!(matches!(result, Err(RateSourceError::NotFound { .. })));
    }

    #[test]
    fn test_複数一致した場合は最初の要素を返す() {
        let rates = parse(
            r#"[
                {"currencyCodeA":840,"currencyCodeB":980,"date":100,"rateCross":1.5},
                {"currencyCodeA":840,"currencyCodeB":980,"date":200,"rateCross":2.5}
            ]"#,
        );

        let rate = find_rate(rates, CurrencyPair::USD_UAH).unwrap();

        assert_eq!(rate.timestamp(), 100);
        assert_eq!(rate.rate_cross, Some(dec!(1.5)));
    }

    #[test]
    fn test_範囲外のタイムスタンプはupstream() {
        let rates = parse(&format!(
            r#"[{{"currencyCodeA":840,"currencyCodeB":980,"date":{}}}]"#,
            i64::MAX
        ));

        let result = find_rate(rates, CurrencyPair::USD_UAH);

        assert!(matches!(result, Err(RateSourceError::Upstream(_))));
    }

    #[test]
    fn test_base_urlの末尾スラッシュは除去される() {
        let source =
            MonobankRateSource::new("https://api.monobank.ua/", Duration::from_secs(1)).unwrap();

        assert_eq!(source.base_url, "https://api.monobank.ua");
    }
}
