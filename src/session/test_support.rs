// src/session/test_support.rs
// Сценарный BotApi для юнит‑тестов сессии

use crate::api::BotApi;
use crate::error::ControlError;
use crate::models::{BotConfig, BotState, BotStatus, PerformancePoint, TradeAction, TradeRecord};
use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

type Scripted<T> = Result<T, String>;

#[derive(Default)]
pub struct ScriptedApi {
    statuses: Mutex<VecDeque<(Duration, Scripted<BotStatus>)>>,
    init_result: Mutex<Option<Result<(), ControlError>>>,
    start_result: Mutex<Option<Result<(), ControlError>>>,
    stop_result: Mutex<Option<Result<(), ControlError>>>,
    trades: Mutex<Option<Scripted<Vec<TradeRecord>>>>,
    performance: Mutex<Option<Scripted<Vec<PerformancePoint>>>>,
    calls: Mutex<Vec<&'static str>>,
    last_limits: Mutex<Option<(u32, u32)>>,
}

impl ScriptedApi {
    pub fn push_status(&self, status: BotStatus) {
        self.push_delayed_status(Duration::ZERO, status);
    }

    pub fn push_delayed_status(&self, delay: Duration, status: BotStatus) {
        self.statuses.lock().unwrap().push_back((delay, Ok(status)));
    }

    pub fn push_status_error(&self, msg: &str) {
        self.statuses.lock().unwrap().push_back((Duration::ZERO, Err(msg.to_string())));
    }

    pub fn set_init(&self, result: Result<(), ControlError>) {
        *self.init_result.lock().unwrap() = Some(result);
    }

    pub fn set_start(&self, result: Result<(), ControlError>) {
        *self.start_result.lock().unwrap() = Some(result);
    }

    pub fn set_stop(&self, result: Result<(), ControlError>) {
        *self.stop_result.lock().unwrap() = Some(result);
    }

    pub fn set_trades(&self, result: Scripted<Vec<TradeRecord>>) {
        *self.trades.lock().unwrap() = Some(result);
    }

    pub fn set_performance(&self, result: Scripted<Vec<PerformancePoint>>) {
        *self.performance.lock().unwrap() = Some(result);
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, name: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| **c == name).count()
    }

    pub fn status_calls(&self) -> usize {
        self.count("status")
    }

    pub fn last_limits(&self) -> Option<(u32, u32)> {
        *self.last_limits.lock().unwrap()
    }

    fn record(&self, name: &'static str) {
        self.calls.lock().unwrap().push(name);
    }

    fn command(&self, name: &'static str, slot: &Mutex<Option<Result<(), ControlError>>>) -> Result<(), ControlError> {
        self.record(name);
        slot.lock().unwrap().clone().unwrap_or(Ok(()))
    }
}

#[async_trait]
impl BotApi for ScriptedApi {
    async fn initialize(&self, _config: &BotConfig) -> Result<(), ControlError> {
        self.command("initialize", &self.init_result)
    }

    async fn start(&self) -> Result<(), ControlError> {
        self.command("start", &self.start_result)
    }

    async fn stop(&self) -> Result<(), ControlError> {
        self.command("stop", &self.stop_result)
    }

    async fn status(&self) -> anyhow::Result<BotStatus> {
        self.record("status");
        let next = self.statuses.lock().unwrap().pop_front();
        let (delay, result) = next.ok_or_else(|| anyhow!("no scripted status left"))?;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        result.map_err(|e| anyhow!(e))
    }

    async fn trades(&self, limit: u32) -> anyhow::Result<Vec<TradeRecord>> {
        self.record("trades");
        let mut limits = self.last_limits.lock().unwrap();
        *limits = Some((limit, limits.map(|l| l.1).unwrap_or(0)));
        drop(limits);
        self.trades.lock().unwrap().clone().unwrap_or(Ok(Vec::new())).map_err(|e| anyhow!(e))
    }

    async fn performance(&self, limit: u32) -> anyhow::Result<Vec<PerformancePoint>> {
        self.record("performance");
        let mut limits = self.last_limits.lock().unwrap();
        *limits = Some((limits.map(|l| l.0).unwrap_or(0), limit));
        drop(limits);
        self.performance.lock().unwrap().clone().unwrap_or(Ok(Vec::new())).map_err(|e| anyhow!(e))
    }
}

pub fn status(state: BotState, value: Decimal, action: Option<TradeAction>) -> BotStatus {
    BotStatus {
        status: state,
        portfolio_value: value,
        cash: dec!(500),
        total_profit_loss: value - dec!(1000),
        total_profit_loss_pct: dec!(0),
        last_action: action,
        market_open: true,
    }
}

pub fn trade(action: TradeAction) -> TradeRecord {
    TradeRecord {
        action,
        shares: dec!(3),
        price: dec!(187.25),
        timestamp: Utc.with_ymd_and_hms(2025, 3, 14, 14, 30, 0).unwrap(),
    }
}

pub fn bot_config(key: &str, secret: &str) -> BotConfig {
    BotConfig {
        model_path: "models/ppo_trading_model".into(),
        alpaca_key: key.into(),
        alpaca_secret: secret.into(),
        ticker: "AAPL".into(),
        check_interval: 300,
        initial_value: dec!(1000),
    }
}
