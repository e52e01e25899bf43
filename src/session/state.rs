// src/session/state.rs

use super::live_feed::{LiveFeed, LiveMessage};
use crate::config::StalePolicy;
use crate::models::{BotState, BotStatus, PerformancePoint, TradeRecord};
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex as TokioMutex;

/// Состояние бота с точки зрения клиента
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Uninitialized,
    InitializedIdle,
    Active,
    Stopped,
    Error,
}

impl Lifecycle {
    /// Переход по статусу из опроса. Сервер главный, клиент только следует.
    pub fn observe(self, observed: BotState) -> Lifecycle {
        match (self, observed) {
            (_, BotState::Active) => Lifecycle::Active,
            (_, BotState::Error) => Lifecycle::Error,
            (Lifecycle::Uninitialized, BotState::Stopped) => Lifecycle::Uninitialized,
            (Lifecycle::InitializedIdle, BotState::Stopped) => Lifecycle::InitializedIdle,
            (_, BotState::Stopped) => Lifecycle::Stopped,
        }
    }

    pub fn is_initialized(self) -> bool {
        self != Lifecycle::Uninitialized
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Lifecycle::Uninitialized => "uninitialized",
            Lifecycle::InitializedIdle => "initialized-idle",
            Lifecycle::Active => "active",
            Lifecycle::Stopped => "stopped",
            Lifecycle::Error => "error",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ApplyOutcome {
    Applied { message: Option<LiveMessage> },
    /// Ответ на более ранний запрос пришёл после более свежего
    Stale,
}

/// Всё, что сессия знает о боте
#[derive(Debug, Clone)]
pub struct SessionState {
    pub status: Option<BotStatus>,
    pub trades: Vec<TradeRecord>,
    pub performance: Vec<PerformancePoint>,
    pub feed: LiveFeed,
    pub lifecycle: Lifecycle,
    applied_seq: u64,
}

pub type SharedState = Arc<TokioMutex<SessionState>>;

impl SessionState {
    pub fn new(feed_capacity: usize) -> Self {
        let mut feed = LiveFeed::new(feed_capacity);
        feed.push(LiveMessage::system("Trading bot panel opened"));
        Self {
            status: None,
            trades: Vec::new(),
            performance: Vec::new(),
            feed,
            lifecycle: Lifecycle::Uninitialized,
            applied_seq: 0,
        }
    }

    pub fn shared(feed_capacity: usize) -> SharedState {
        Arc::new(TokioMutex::new(Self::new(feed_capacity)))
    }

    pub fn observed_state(&self) -> Option<BotState> {
        self.status.as_ref().map(|s| s.status)
    }

    /// Применяет ответ опроса с номером `seq`; снимок заменяется целиком
    pub fn apply_status(&mut self, seq: u64, status: BotStatus, policy: StalePolicy) -> ApplyOutcome {
        if policy == StalePolicy::DiscardOutOfOrder && seq < self.applied_seq {
            return ApplyOutcome::Stale;
        }
        self.applied_seq = self.applied_seq.max(seq);
        self.lifecycle = self.lifecycle.observe(status.status);

        let message = status.last_action.and_then(LiveMessage::for_action);
        if let Some(ref m) = message {
            self.feed.push(m.clone());
        }
        self.status = Some(status);
        ApplyOutcome::Applied { message }
    }
}
