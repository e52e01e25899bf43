// src/models.rs
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Состояние бота, как его сообщает сервис
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BotState {
    Stopped,
    Active,
    Error,
}

impl fmt::Display for BotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BotState::Stopped => write!(f, "stopped"),
            BotState::Active => write!(f, "active"),
            BotState::Error => write!(f, "error"),
        }
    }
}

/// Последнее решение модели
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeAction {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeAction::Buy => write!(f, "BUY"),
            TradeAction::Sell => write!(f, "SELL"),
            TradeAction::Hold => write!(f, "HOLD"),
        }
    }
}

/// Снимок `/bot/status`. Заменяется целиком при каждом опросе.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BotStatus {
    pub status: BotState,
    #[serde(default)]
    pub portfolio_value: Decimal,
    #[serde(default)]
    pub cash: Decimal,
    #[serde(rename = "total_pl", default)]
    pub total_profit_loss: Decimal,
    #[serde(rename = "total_pl_pct", default)]
    pub total_profit_loss_pct: Decimal,
    #[serde(default)]
    pub last_action: Option<TradeAction>,
    #[serde(default)]
    pub market_open: bool,
}

/// Параметры инициализации бота (`POST /bot/initialize`)
#[derive(Clone, Serialize)]
pub struct BotConfig {
    pub model_path: String,
    pub alpaca_key: String,
    pub alpaca_secret: String,
    pub ticker: String,
    pub check_interval: u64,
    #[serde(with = "rust_decimal::serde::float")]
    pub initial_value: Decimal,
}

// Ключи не должны попадать в логи
impl fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotConfig")
            .field("model_path", &self.model_path)
            .field("alpaca_key", &"***")
            .field("alpaca_secret", &"***")
            .field("ticker", &self.ticker)
            .field("check_interval", &self.check_interval)
            .field("initial_value", &self.initial_value)
            .finish()
    }
}

/// Запись истории сделок
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TradeRecord {
    pub action: TradeAction,
    pub shares: Decimal,
    pub price: Decimal,
    pub timestamp: DateTime<Utc>,
}

/// Точка временного ряда `/bot/performance`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PerformancePoint {
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub portfolio_value: Decimal,
    #[serde(default)]
    pub cash: Decimal,
    #[serde(default)]
    pub position_value: Decimal,
}

/// Ответ командных эндпоинтов
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommandResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TradesResponse {
    #[serde(default)]
    pub trades: Vec<TradeRecord>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PerformanceResponse {
    #[serde(default)]
    pub performance: Vec<PerformancePoint>,
}
