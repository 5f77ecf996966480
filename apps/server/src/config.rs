//! # サーバー設定
//!
//! YAML ファイルと環境変数から RateWatch サーバーの設定を読み込む。
//!
//! ## 読み込み順序
//!
//! 1. YAML ファイル（`RATEWATCH_CONFIG`、未設定時は `config/local.yaml`。存在しなくてもよい）
//! 2. 環境変数（`RATEWATCH__SECTION__KEY` 形式。例: `RATEWATCH__SERVER__PORT=9000`）
//!
//! 後に読んだ値が優先される。どこにも指定がない項目は既定値を使う。
//!
//! ## 検証
//!
//! 読み込み直後に [`AppConfig::validate`] を実行し、起動前に設定不備を検出する。

use std::{env, time::Duration};

use chrono::NaiveTime;
use chrono_tz::Tz;
use config::{Config, Environment, File, FileFormat};
use ratewatch_domain::notification::EnvelopeFromTemplate;
use ratewatch_infra::{SmtpSettings, SmtpTls};
use serde::Deserialize;
use thiserror::Error;

use crate::{scheduler::DailySchedule, usecase::NotificationSettings};

/// 設定ファイルのパスを指定する環境変数
pub const CONFIG_PATH_ENV: &str = "RATEWATCH_CONFIG";

/// 設定ファイルの既定パス
pub const DEFAULT_CONFIG_PATH: &str = "config/local.yaml";

/// 設定読み込みエラー
#[derive(Debug, Error)]
pub enum ConfigError {
    /// ファイルまたは環境変数を読み込めない、型が合わない
    #[error("設定の読み込みに失敗: {0}")]
    Load(#[from] config::ConfigError),

    /// 値は読めたがルールに違反している
    #[error("設定値が不正: {0}")]
    Invalid(String),
}

/// RateWatch サーバーの設定
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server:   ServerConfig,
    pub database: DatabaseConfig,
    pub monobank: MonobankConfig,
    pub email:    EmailConfig,
    pub schedule: ScheduleConfig,
}

/// HTTP サーバーの設定
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// バインドアドレス
    pub host: String,
    /// ポート番号
    pub port: u16,
}

/// データベースの設定
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite 接続 URL
    pub url: String,
}

/// Monobank API の設定
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonobankConfig {
    /// ベース URL
    pub url:          String,
    /// リクエストタイムアウト（秒）
    pub timeout_secs: u64,
}

/// メール送信バックエンド
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MailBackend {
    /// SMTP サーバー経由で送信
    Smtp,
    /// 送信しない（ログ出力のみ）
    #[default]
    Noop,
}

/// 通知メールの設定
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    pub backend:          MailBackend,
    /// SMTP ホスト（backend=smtp の場合に使用）
    pub host:             String,
    /// SMTP ポート（backend=smtp の場合に使用）
    pub port:             u16,
    pub tls:              SmtpTls,
    pub username:         Option<String>,
    pub password:         Option<String>,
    /// `From` ヘッダー
    pub from:             String,
    /// エンベロープ送信者。`{token}` を含む必要がある
    pub envelope_from:    String,
    /// 件名テンプレート（tera）
    pub subject:          String,
    /// 本文テンプレート（tera）
    pub message_template: String,
    /// SMTP タイムアウト（秒）
    pub timeout_secs:     u64,
}

/// 通知ジョブの起動時刻
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// 起動時刻（`HH:MM`）
    pub time:     String,
    /// IANA タイムゾーン名（例: `Europe/Kyiv`）
    pub timezone: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://storage.db?mode=rwc".to_string(),
        }
    }
}

impl Default for MonobankConfig {
    fn default() -> Self {
        Self {
            url:          "https://api.monobank.ua".to_string(),
            timeout_secs: 10,
        }
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            backend:          MailBackend::default(),
            host:             "localhost".to_string(),
            port:             1025,
            tls:              SmtpTls::default(),
            username:         None,
            password:         None,
            from:             "RateWatch <noreply@ratewatch.example.com>".to_string(),
            envelope_from:    "bounce+{token}@ratewatch.example.com".to_string(),
            subject:          "{{ base_currency }}/{{ quote_currency }} exchange rate".to_string(),
            message_template: concat!(
                "{{ base_currency }}/{{ quote_currency }} as of {{ date }}\n",
                "Sell: {{ rate_sell }}\n",
                "Buy: {{ rate_buy }}\n",
            )
            .to_string(),
            timeout_secs:     30,
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            time:     "01:00".to_string(),
            timezone: "UTC".to_string(),
        }
    }
}

impl AppConfig {
    /// 設定ファイルと環境変数から設定を読み込み、検証する
    pub fn load() -> Result<Self, ConfigError> {
        let path = env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        let source = Config::builder()
            .add_source(File::new(&path, FileFormat::Yaml).required(false))
            .add_source(environment())
            .build()?;

        Self::from_source(source)
    }

    /// 組み立て済みのソースから設定を取り出し、検証する
    pub fn from_source(source: Config) -> Result<Self, ConfigError> {
        let config: Self = source.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// 起動前に検出できる設定不備をチェックする
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.email.notification_settings()?;
        self.schedule.daily_schedule()?;

        if self.email.backend == MailBackend::Smtp && self.email.host.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "email.backend=smtp の場合は email.host が必要です".to_string(),
            ));
        }

        Ok(())
    }
}

impl ServerConfig {
    /// `host:port` 形式のバインドアドレス
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl MonobankConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl EmailConfig {
    /// 通知ジョブに渡すメッセージ設定
    pub fn notification_settings(&self) -> Result<NotificationSettings, ConfigError> {
        let envelope_from = EnvelopeFromTemplate::new(self.envelope_from.clone())
            .map_err(|e| ConfigError::Invalid(format!("email.envelope_from: {e}")))?;

        Ok(NotificationSettings {
            from: self.from.clone(),
            envelope_from,
            subject: self.subject.clone(),
            message_template: self.message_template.clone(),
        })
    }

    pub fn smtp_settings(&self) -> SmtpSettings {
        SmtpSettings {
            host:     self.host.clone(),
            port:     self.port,
            tls:      self.tls,
            username: self.username.clone(),
            password: self.password.clone(),
            timeout:  Duration::from_secs(self.timeout_secs),
        }
    }
}

impl ScheduleConfig {
    pub fn daily_schedule(&self) -> Result<DailySchedule, ConfigError> {
        let at = NaiveTime::parse_from_str(&self.time, "%H:%M").map_err(|e| {
            ConfigError::Invalid(format!(
                "schedule.time は HH:MM 形式である必要があります: {} ({e})",
                self.time
            ))
        })?;

        let tz = self.timezone.parse::<Tz>().map_err(|e| {
            ConfigError::Invalid(format!(
                "schedule.timezone が不明です: {} ({e})",
                self.timezone
            ))
        })?;

        Ok(DailySchedule::new(at, tz))
    }
}

/// `RATEWATCH__SECTION__KEY` 形式の環境変数ソース
fn environment() -> Environment {
    Environment::with_prefix("RATEWATCH")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}
