// src/session/live_feed.rs

use crate::models::TradeAction;
use chrono::{DateTime, Local};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    System,
    Buy,
    Sell,
}

/// Запись живой ленты
#[derive(Debug, Clone, PartialEq)]
pub struct LiveMessage {
    pub time: DateTime<Local>,
    pub message: String,
    pub kind: MessageKind,
}

impl LiveMessage {
    pub fn system(message: impl Into<String>) -> Self {
        Self {
            time: Local::now(),
            message: message.into(),
            kind: MessageKind::System,
        }
    }

    /// HOLD в ленту не пишется
    pub fn for_action(action: TradeAction) -> Option<Self> {
        let kind = match action {
            TradeAction::Buy => MessageKind::Buy,
            TradeAction::Sell => MessageKind::Sell,
            TradeAction::Hold => return None,
        };
        Some(Self {
            time: Local::now(),
            message: format!("{} executed", action),
            kind,
        })
    }

    /// `HH:MM:SS`
    pub fn time_label(&self) -> String {
        self.time.format("%H:%M:%S").to_string()
    }
}

/// Ограниченная лента: при переполнении вытесняются самые старые записи
#[derive(Debug, Clone)]
pub struct LiveFeed {
    capacity: usize,
    entries: VecDeque<LiveMessage>,
}

impl LiveFeed {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, msg: LiveMessage) {
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(msg);
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&LiveMessage> {
        self.entries.back()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &LiveMessage> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feed_never_exceeds_capacity() {
        let mut feed = LiveFeed::new(21);
        for i in 0..100 {
            let action = if i % 2 == 0 { TradeAction::Buy } else { TradeAction::Sell };
            feed.push(LiveMessage::for_action(action).unwrap());
            assert!(feed.len() <= 21);
        }
        assert_eq!(feed.len(), 21);
    }

    #[test]
    fn oldest_entries_are_evicted_first() {
        let mut feed = LiveFeed::new(3);
        for i in 0..5 {
            feed.push(LiveMessage::system(format!("msg {}", i)));
        }
        let texts: Vec<_> = feed.iter().map(|m| m.message.as_str()).collect();
        assert_eq!(texts, vec!["msg 2", "msg 3", "msg 4"]);
    }

    #[test]
    fn hold_produces_no_message() {
        assert!(LiveMessage::for_action(TradeAction::Hold).is_none());
        let sell = LiveMessage::for_action(TradeAction::Sell).unwrap();
        assert_eq!(sell.kind, MessageKind::Sell);
        assert_eq!(sell.message, "SELL executed");
        assert_eq!(sell.time_label().len(), 8);
    }
}
