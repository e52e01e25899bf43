// src/api/mod.rs
pub mod http;

pub use http::HttpBotApi;

use crate::error::ControlError;
use crate::models::{BotConfig, BotStatus, PerformancePoint, TradeRecord};
use async_trait::async_trait;

/// Удалённый сервис торгового бота
#[async_trait]
pub trait BotApi: Send + Sync {
    async fn initialize(&self, config: &BotConfig) -> Result<(), ControlError>;
    async fn start(&self) -> Result<(), ControlError>;
    async fn stop(&self) -> Result<(), ControlError>;
    async fn status(&self) -> anyhow::Result<BotStatus>;
    async fn trades(&self, limit: u32) -> anyhow::Result<Vec<TradeRecord>>;
    async fn performance(&self, limit: u32) -> anyhow::Result<Vec<PerformancePoint>>;
}
