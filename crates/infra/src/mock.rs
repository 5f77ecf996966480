//! # テスト用モック
//!
//! ユースケーステストやハンドラーテストで使用するインメモリモック。
//! `test-utils` feature を有効にすることで、他クレートからも利用可能。
//!
//! ```toml
//! [dev-dependencies]
//! ratewatch-infra = { workspace = true, features = ["test-utils"] }
//! ```

use std::sync::{
    Arc,
    Mutex,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use ratewatch_domain::{
    currency::{CurrencyPair, CurrencyRate},
    notification::{EmailMessage, NotificationError},
};

use crate::{
    error::InfraError,
    notification::MailTransport,
    rate_source::{RateSource, RateSourceError},
    repository::SubscriberRepository,
};

// ===== MockSubscriberRepository =====

/// インメモリの購読者リポジトリ
///
/// 一意性は ASCII の大文字小文字を区別せずに判定する（SQLite の `NOCASE` と同じ）。
#[derive(Clone, Default)]
pub struct MockSubscriberRepository {
    emails: Arc<Mutex<Vec<String>>>,
    fail:   bool,
}

impl MockSubscriberRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 指定したアドレスを保存済みの状態で作成する
    pub fn with_emails<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            emails: Arc::new(Mutex::new(emails.into_iter().map(Into::into).collect())),
            fail:   false,
        }
    }

    /// 全操作が永続化エラーを返すリポジトリを作成する
    pub fn failing() -> Self {
        Self {
            emails: Arc::default(),
            fail:   true,
        }
    }

    /// 保存済みのアドレス
    pub fn emails(&self) -> Vec<String> {
        self.emails.lock().unwrap().clone()
    }
}

#[async_trait]
impl SubscriberRepository for MockSubscriberRepository {
    async fn save_email(&self, email: &str) -> Result<(), InfraError> {
        if self.fail {
            return Err(InfraError::unexpected("mock: save_email failed"));
        }

        let mut emails = self.emails.lock().unwrap();
        if emails.iter().any(|e| e.eq_ignore_ascii_case(email)) {
            return Err(InfraError::conflict("Subscriber", email));
        }
        emails.push(email.to_string());
        Ok(())
    }

    async fn list_emails(&self) -> Result<Vec<String>, InfraError> {
        if self.fail {
            return Err(InfraError::unexpected("mock: list_emails failed"));
        }

        Ok(self.emails.lock().unwrap().clone())
    }
}

// ===== MockRateSource =====

/// 固定の結果を返すレート取得元
///
/// 呼び出し回数を記録する。
#[derive(Clone)]
pub struct MockRateSource {
    result: Arc<Result<CurrencyRate, RateSourceError>>,
    calls:  Arc<AtomicUsize>,
}

impl MockRateSource {
    /// 常に指定したレートを返す
    pub fn returning(rate: CurrencyRate) -> Self {
        Self {
            result: Arc::new(Ok(rate)),
            calls:  Arc::default(),
        }
    }

    /// 常に指定したエラーを返す
    pub fn failing(error: RateSourceError) -> Self {
        Self {
            result: Arc::new(Err(error)),
            calls:  Arc::default(),
        }
    }

    /// `fetch_rate` が呼ばれた回数
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RateSource for MockRateSource {
    async fn fetch_rate(&self, _pair: CurrencyPair) -> Result<CurrencyRate, RateSourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (*self.result).clone()
    }
}

// ===== MockMailTransport =====

/// 受け取ったバッチを記録するメール送信
#[derive(Clone, Default)]
pub struct MockMailTransport {
    batches: Arc<Mutex<Vec<Vec<EmailMessage>>>>,
    fail:    bool,
}

impl MockMailTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// バッチを記録したうえで送信失敗を返す
    pub fn failing() -> Self {
        Self {
            batches: Arc::default(),
            fail:    true,
        }
    }

    /// `send` に渡されたバッチ（呼び出し順）
    pub fn batches(&self) -> Vec<Vec<EmailMessage>> {
        self.batches.lock().unwrap().clone()
    }

    /// `send` が呼ばれた回数
    pub fn call_count(&self) -> usize {
        self.batches.lock().unwrap().len()
    }
}

#[async_trait]
impl MailTransport for MockMailTransport {
    async fn send(&self, batch: &[EmailMessage]) -> Result<(), NotificationError> {
        self.batches.lock().unwrap().push(batch.to_vec());

        if self.fail {
            return Err(NotificationError::SendFailed(
                "mock: SMTP unavailable".to_string(),
            ));
        }
        Ok(())
    }
}
