//! # ドメイン層エラー定義
//!
//! 値オブジェクトの生成時に検出するルール違反を表現するエラー型。
//!
//! ## 設計方針
//!
//! - **thiserror 活用**: `#[error(...)]` マクロでエラーメッセージを自動生成
//! - **HTTP ステータスへの非依存**: ステータスコードへの変換は API 層の責務
//!
//! ## 使用例
//!
//! ```rust
//! use ratewatch_domain::DomainError;
//!
//! fn validate_subject(subject: &str) -> Result<(), DomainError> {
//!     if subject.is_empty() {
//!         return Err(DomainError::Validation("件名は必須です".to_string()));
//!     }
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// ドメイン層で発生するエラー
#[derive(Debug, Error)]
pub enum DomainError {
    /// バリデーションエラー
    ///
    /// 入力値や設定値がルールに違反している場合に使用する。
    ///
    /// # 例
    ///
    /// - 範囲外のタイムスタンプ
    /// - プレースホルダを含まないフォーマット文字列
    #[error("バリデーションエラー: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validationのメッセージ() {
        let err = DomainError::Validation("件名は必須です".to_string());
        assert_eq!(err.to_string(), "バリデーションエラー: 件名は必須です");
    }
}
