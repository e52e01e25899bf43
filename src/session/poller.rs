// src/session/poller.rs

use super::live_feed::LiveMessage;
use super::state::{ApplyOutcome, SharedState};
use crate::api::BotApi;
use crate::config::StalePolicy;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};

/// Лимиты для истории сделок и графика
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardLimits {
    pub trades: u32,
    pub performance: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct PollSettings {
    pub interval: Duration,
    pub stale_policy: StalePolicy,
    pub dashboard: Option<DashboardLimits>,
}

/// Периодический опрос `/bot/status`
pub struct StatusPoller<A> {
    api: Arc<A>,
    state: SharedState,
    settings: PollSettings,
    seq: Arc<AtomicU64>,
    active: Arc<AtomicBool>,
    feed_tx: Option<mpsc::UnboundedSender<LiveMessage>>,
}

// derive(Clone) потребовал бы A: Clone
impl<A> Clone for StatusPoller<A> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
            state: self.state.clone(),
            settings: self.settings,
            seq: self.seq.clone(),
            active: self.active.clone(),
            feed_tx: self.feed_tx.clone(),
        }
    }
}

impl<A> StatusPoller<A>
where
    A: BotApi + 'static,
{
    pub fn new(
        api: Arc<A>,
        state: SharedState,
        settings: PollSettings,
        feed_tx: Option<mpsc::UnboundedSender<LiveMessage>>,
    ) -> Self {
        Self {
            api,
            state,
            settings,
            seq: Arc::new(AtomicU64::new(0)),
            active: Arc::new(AtomicBool::new(true)),
            feed_tx,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Один запрос статуса. Ошибка только логируется, прежний снимок остаётся.
    /// Возвращает true, если ответ применён.
    pub async fn poll_once(&self) -> bool {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        let status = match self.api.status().await {
            Ok(s) => s,
            Err(e) => {
                warn!("status poll #{} failed, keeping previous snapshot: {:#}", seq, e);
                return false;
            }
        };

        if !self.is_active() {
            debug!("status poll #{} finished after session close, ignored", seq);
            return false;
        }

        let outcome = {
            let mut st = self.state.lock().await;
            st.apply_status(seq, status, self.settings.stale_policy)
        };

        match outcome {
            ApplyOutcome::Applied { message } => {
                if let (Some(msg), Some(tx)) = (message, &self.feed_tx) {
                    // получатель мог уже закрыться
                    let _ = tx.send(msg);
                }
                true
            }
            ApplyOutcome::Stale => {
                debug!("status poll #{} is older than the applied one, discarded", seq);
                false
            }
        }
    }

    /// Системное сообщение: в ленту сессии и подписчикам `/watch`
    pub async fn announce(&self, message: LiveMessage) {
        self.state.lock().await.feed.push(message.clone());
        if let Some(tx) = &self.feed_tx {
            let _ = tx.send(message);
        }
    }

    /// История сделок и ряд доходности; каждый запрос падает независимо
    pub async fn refresh_dashboard(&self) {
        let Some(limits) = self.settings.dashboard else {
            return;
        };
        let (trades, performance) = futures::join!(
            self.api.trades(limits.trades),
            self.api.performance(limits.performance),
        );
        if !self.is_active() {
            return;
        }

        let mut st = self.state.lock().await;
        match trades {
            Ok(t) => st.trades = t,
            Err(e) => warn!("trades refresh failed: {:#}", e),
        }
        match performance {
            Ok(p) => st.performance = p,
            Err(e) => warn!("performance refresh failed: {:#}", e),
        }
    }

    async fn tick(&self) {
        self.poll_once().await;
        self.refresh_dashboard().await;
    }

    /// Запускает таймер. Первый опрос идёт сразу, далее каждые `interval`.
    /// Каждый тик опрашивает в отдельной задаче, поэтому медленный ответ
    /// может пересечься со следующим тиком.
    pub fn spawn(&self) -> PollerHandle {
        let poller = self.clone();
        let period = self.settings.interval;
        let task = tokio::spawn(async move {
            let mut timer = interval(period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                timer.tick().await;
                let p = poller.clone();
                tokio::spawn(async move { p.tick().await });
            }
        });
        info!("status poller started, interval = {:?}", period);

        PollerHandle {
            task: task.abort_handle(),
            active: self.active.clone(),
        }
    }
}

/// Владение таймером опроса: при drop таймер гарантированно снимается,
/// а ответы уже отправленных запросов игнорируются.
#[derive(Debug)]
pub struct PollerHandle {
    task: AbortHandle,
    active: Arc<AtomicBool>,
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.active.store(false, Ordering::SeqCst);
        self.task.abort();
        debug!("status poller stopped");
    }
}
