// src/session/mod.rs

pub mod controller;
pub mod live_feed;
pub mod poller;
pub mod state;

#[cfg(test)]
pub(crate) mod test_support;

pub use controller::{CommandOutcome, LifecycleController, validate_config};
pub use live_feed::{LiveFeed, LiveMessage, MessageKind};
pub use poller::{DashboardLimits, PollSettings, PollerHandle, StatusPoller};
pub use state::{Lifecycle, SessionState, SharedState};

use crate::api::BotApi;
use crate::config::{Config, StalePolicy};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    pub poll_interval: Duration,
    pub feed_capacity: usize,
    pub stale_policy: StalePolicy,
    pub dashboard: Option<DashboardLimits>,
}

impl SessionSettings {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            poll_interval: cfg.poll_interval(),
            feed_capacity: cfg.live_feed_capacity,
            stale_policy: cfg.stale_policy,
            dashboard: Some(DashboardLimits {
                trades: cfg.trades_limit,
                performance: cfg.performance_limit,
            }),
        }
    }
}

/// Сессия панели управления: состояние, опрос и команды.
/// Таймер опроса живёт ровно столько, сколько сессия.
pub struct Session<A> {
    state: SharedState,
    poller: StatusPoller<A>,
    controller: LifecycleController<A>,
    _poll_timer: PollerHandle,
}

impl<A> Session<A>
where
    A: BotApi + 'static,
{
    /// Должна вызываться внутри tokio runtime
    pub fn open(
        api: Arc<A>,
        settings: SessionSettings,
        feed_tx: Option<mpsc::UnboundedSender<LiveMessage>>,
    ) -> Self {
        let state = SessionState::shared(settings.feed_capacity);
        let poller = StatusPoller::new(
            api.clone(),
            state.clone(),
            PollSettings {
                interval: settings.poll_interval,
                stale_policy: settings.stale_policy,
                dashboard: settings.dashboard,
            },
            feed_tx,
        );
        let controller = LifecycleController::new(api, state.clone(), poller.clone());
        let poll_timer = poller.spawn();

        Self {
            state,
            poller,
            controller,
            _poll_timer: poll_timer,
        }
    }

    pub fn controller(&self) -> &LifecycleController<A> {
        &self.controller
    }

    /// Внеочередное обновление (кнопка "Обновить")
    pub async fn refresh(&self) {
        self.poller.poll_once().await;
        self.poller.refresh_dashboard().await;
    }

    /// Копия состояния для отрисовки
    pub async fn snapshot(&self) -> SessionState {
        self.state.lock().await.clone()
    }

    /// Обновляет статус и списки, затем отдаёт копию. Только что открытая
    /// сессия иначе показала бы пустые данные до первого тика.
    pub async fn fresh_snapshot(&self) -> SessionState {
        self.refresh().await;
        self.snapshot().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BotState, TradeAction};
    use crate::session::test_support::{ScriptedApi, status, trade};
    use rust_decimal_macros::dec;

    fn settings() -> SessionSettings {
        SessionSettings {
            poll_interval: Duration::from_secs(5),
            feed_capacity: 21,
            stale_policy: StalePolicy::LastWriteWins,
            dashboard: Some(DashboardLimits { trades: 10, performance: 50 }),
        }
    }

    #[tokio::test]
    async fn fresh_snapshot_of_new_session_has_service_data() {
        let api = Arc::new(ScriptedApi::default());
        api.push_status(status(BotState::Active, dec!(1005.50), None));
        api.push_status(status(BotState::Active, dec!(1005.50), None));
        api.set_trades(Ok(vec![trade(TradeAction::Buy), trade(TradeAction::Sell)]));
        let session = Session::open(api.clone(), settings(), None);

        let snapshot = session.fresh_snapshot().await;
        assert_eq!(snapshot.trades.len(), 2);
        assert_eq!(snapshot.observed_state(), Some(BotState::Active));
        assert_eq!(api.last_limits(), Some((10, 50)));
    }
}
