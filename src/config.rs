// src/config.rs
use anyhow::{Result, bail};
use config::{Config as Loader, Environment, File};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::env;
use std::time::Duration;

/// Что делать с ответом опроса, который пришёл позже более свежего
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StalePolicy {
    /// Побеждает последний завершившийся ответ
    #[default]
    LastWriteWins,
    /// Ответ на более ранний запрос отбрасывается
    DiscardOutOfOrder,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    // Telegram
    pub telegram_token: String,

    // Удалённый сервис бота
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    // Опрос
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_live_feed_capacity")]
    pub live_feed_capacity: usize,
    #[serde(default = "default_trades_limit")]
    pub trades_limit: u32,
    #[serde(default = "default_performance_limit")]
    pub performance_limit: u32,
    #[serde(default)]
    pub stale_policy: StalePolicy,
    /// Сессия без обращений дольше этого закрывается (кроме /watch)
    #[serde(default = "default_session_idle_secs")]
    pub session_idle_secs: u64,

    // Значения формы инициализации по умолчанию
    #[serde(default = "default_model_path")]
    pub default_model_path: String,
    #[serde(default = "default_ticker")]
    pub default_ticker: String,
    #[serde(default = "default_check_interval")]
    pub default_check_interval: u64,
    #[serde(default = "default_initial_value")]
    pub default_initial_value: Decimal,
}

fn default_api_base_url() -> String { "https://mock-trading-api.onrender.com/api".into() }
fn default_http_timeout_secs() -> u64 { 10 }
fn default_poll_interval_secs() -> u64 { 5 }
// последние 20 + новое сообщение
fn default_live_feed_capacity() -> usize { 21 }
fn default_session_idle_secs() -> u64 { 1800 }
fn default_trades_limit() -> u32 { 10 }
fn default_performance_limit() -> u32 { 50 }
fn default_model_path() -> String { "models/ppo_trading_model".into() }
fn default_ticker() -> String { "AAPL".into() }
fn default_check_interval() -> u64 { 300 }
fn default_initial_value() -> Decimal { dec!(1000) }

impl Config {
    pub fn load() -> Result<Self> {
        let file = env::var("BOTPANEL_CONFIG").unwrap_or_else(|_| "Config.toml".into());
        let loader = Loader::builder()
            .add_source(File::with_name(&file).required(false))
            .add_source(Environment::with_prefix("BOTPANEL").separator("__"))
            .build()?;
        let cfg: Config = loader.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_secs == 0 {
            bail!("poll_interval_secs must be > 0");
        }
        if self.live_feed_capacity == 0 {
            bail!("live_feed_capacity must be > 0");
        }
        if self.session_idle_secs == 0 {
            bail!("session_idle_secs must be > 0");
        }
        if self.http_timeout_secs == 0 {
            bail!("http_timeout_secs must be > 0");
        }
        url::Url::parse(&self.api_base_url)
            .map_err(|e| anyhow::anyhow!("invalid api_base_url `{}`: {}", self.api_base_url, e))?;
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn session_idle(&self) -> Duration {
        Duration::from_secs(self.session_idle_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}
