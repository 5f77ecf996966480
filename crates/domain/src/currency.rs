//! # 為替レート
//!
//! 通貨コードと為替レートの値オブジェクトを定義する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 備考 |
//! |---|------------|------|
//! | [`CurrencyCode`] | 通貨コード | ISO 4217 の数値コード（USD = 840, UAH = 980） |
//! | [`CurrencyPair`] | 通貨ペア | (基準通貨, 相手通貨) の組 |
//! | [`CurrencyRate`] | 為替レート | 取得のたびに生成される一時的な値。永続化しない |
//!
//! ## 設計方針
//!
//! - **数値は `Decimal`**: 取得元の値を丸めずにそのまま保持する
//! - **欠損を許容**: 取得元はペアによって売値・買値・クロスレートの一部を返さないため `Option` で持つ
//! - **日時は UTC**: 表示用の整形は [`CurrencyRate::formatted_date`] で決定的に行う

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::DomainError;

/// 通貨コード（ISO 4217 数値コード）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CurrencyCode(u16);

impl CurrencyCode {
    /// 米ドル
    pub const USD: Self = Self(840);
    /// ウクライナ・フリヴニャ
    pub const UAH: Self = Self(980);

    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    pub const fn as_u16(&self) -> u16 {
        self.0
    }

    /// 既知の通貨であればアルファベットコードを返す
    pub fn alpha_code(&self) -> Option<&'static str> {
        match self.0 {
            840 => Some("USD"),
            980 => Some("UAH"),
            _ => None,
        }
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.alpha_code() {
            Some(alpha) => write!(f, "{alpha}"),
            None => write!(f, "{:03}", self.0),
        }
    }
}

/// 通貨ペア
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CurrencyPair {
    /// 基準通貨
    pub base:  CurrencyCode,
    /// 相手通貨
    pub quote: CurrencyCode,
}

impl CurrencyPair {
    /// 通知対象の固定ペア（USD → UAH）
    pub const USD_UAH: Self = Self {
        base:  CurrencyCode::USD,
        quote: CurrencyCode::UAH,
    };
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

/// 為替レート
///
/// 取得元から受け取った 1 ペア分のレート。リクエストやジョブ実行ごとに
/// 取得し直し、どのコンポーネントも保持し続けない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyRate {
    pub pair:       CurrencyPair,
    /// レートの基準日時（秒精度）
    pub date:       DateTime<Utc>,
    pub rate_sell:  Option<Decimal>,
    pub rate_buy:   Option<Decimal>,
    pub rate_cross: Option<Decimal>,
}

impl CurrencyRate {
    /// UNIX 秒からレートを作成する
    ///
    /// chrono で表現できない範囲のタイムスタンプは `DomainError::Validation` になる。
    pub fn from_unix(
        pair: CurrencyPair,
        timestamp: i64,
        rate_sell: Option<Decimal>,
        rate_buy: Option<Decimal>,
        rate_cross: Option<Decimal>,
    ) -> Result<Self, DomainError> {
        let date = DateTime::from_timestamp(timestamp, 0).ok_or_else(|| {
            DomainError::Validation(format!("不正なタイムスタンプです: {timestamp}"))
        })?;

        Ok(Self {
            pair,
            date,
            rate_sell,
            rate_buy,
            rate_cross,
        })
    }

    /// UNIX 秒を返す
    pub fn timestamp(&self) -> i64 {
        self.date.timestamp()
    }

    /// 表示用の日時文字列（RFC 3339, UTC, 秒精度）
    ///
    /// 同じタイムスタンプからは常に同じ文字列が得られる。
    pub fn formatted_date(&self) -> String {
        self.date.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    use super::*;

    #[rstest]
    #[case(CurrencyCode::USD, "USD")]
    #[case(CurrencyCode::UAH, "UAH")]
    #[case(CurrencyCode::new(978), "978")]
    #[case(CurrencyCode::new(36), "036")]
    fn 通貨コードの表示形式(#[case] code: CurrencyCode, #[case] expected: &str) {
        assert_eq!(code.to_string(), expected);
    }

    #[test]
    fn usd_uahペアの表示() {
        assert_eq!(CurrencyPair::USD_UAH.to_string(), "USD/UAH");
        assert_eq!(CurrencyPair::USD_UAH.base.as_u16(), 840);
        assert_eq!(CurrencyPair::USD_UAH.quote.as_u16(), 980);
    }

    #[test]
    fn from_unixで値がそのまま保持される() {
        let rate = CurrencyRate::from_unix(
            CurrencyPair::USD_UAH,
            1_714_521_600,
            Some(dec!(39.7006)),
            Some(dec!(39.25)),
            None,
        )
        .unwrap();

        assert_eq!(rate.timestamp(), 1_714_521_600);
        assert_eq!(rate.rate_sell, Some(dec!(39.7006)));
        assert_eq!(rate.rate_buy, Some(dec!(39.25)));
        assert_eq!(rate.rate_cross, None);
    }

    #[rstest]
    #[case(0, "1970-01-01T00:00:00Z")]
    #[case(1_714_521_600, "2024-05-01T00:00:00Z")]
    #[case(1_714_566_301, "2024-05-01T12:25:01Z")]
    fn formatted_dateはタイムスタンプから決定的に導かれる(
        #[case] timestamp: i64,
        #[case] expected: &str,
    ) {
        let rate =
            CurrencyRate::from_unix(CurrencyPair::USD_UAH, timestamp, None, None, None).unwrap();

        assert_eq!(rate.formatted_date(), expected);
        assert_eq!(rate.formatted_date(), rate.formatted_date());
    }

    #[test]
    fn 範囲外のタイムスタンプはバリデーションエラー() {
        let result = CurrencyRate::from_unix(CurrencyPair::USD_UAH, i64::MAX, None, None, None);

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }
}
