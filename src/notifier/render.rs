// src/notifier/render.rs

use super::window::Window;
use crate::models::{BotState, PerformancePoint, TradeAction, TradeRecord};
use crate::session::{LiveFeed, LiveMessage, MessageKind, SessionState};
use crate::utils::{format_currency, format_percent};
use rust_decimal::Decimal;

const RECENT_TRADES_SHOWN: usize = 3;

pub fn status_window(state: &SessionState) -> String {
    let window = Window::titled("Trading Bot Control Center").icon("🤖");
    let Some(status) = state.status.as_ref() else {
        return window.render(&format!(
            "Статус ещё не получен.\nСессия: {}",
            state.lifecycle
        ));
    };

    let badge = match status.status {
        BotState::Active => "● ACTIVE",
        BotState::Stopped => "○ IDLE",
        BotState::Error => "⚠ ERROR",
    };
    let market = if status.market_open { "🟢 рынок открыт" } else { "🔴 рынок закрыт" };
    let pl_icon = if status.total_profit_loss >= Decimal::ZERO { "📈" } else { "📉" };
    let last_action = status
        .last_action
        .map(|a| a.to_string())
        .unwrap_or_else(|| "—".into());

    let body = format!(
        "{} ({})\n{}\nПортфель: {}\nКэш: {}\n{} P/L: {} ({})\nПоследнее действие: {}\nСессия: {}",
        badge,
        status.status,
        market,
        format_currency(status.portfolio_value),
        format_currency(status.cash),
        pl_icon,
        format_currency(status.total_profit_loss),
        format_percent(status.total_profit_loss_pct),
        last_action,
        state.lifecycle,
    );
    window.render(&body)
}

pub fn trades_window(trades: &[TradeRecord]) -> String {
    let window = Window::titled("Recent Trades").icon("📜");
    if trades.is_empty() {
        return window.render("Сделок пока нет.");
    }
    let lines: Vec<String> = trades
        .iter()
        .take(RECENT_TRADES_SHOWN)
        .map(|t| {
            let icon = match t.action {
                TradeAction::Buy => "🟢",
                TradeAction::Sell => "🔴",
                TradeAction::Hold => "⚪",
            };
            format!(
                "{} {} {} shares @ {}  {}",
                icon,
                t.action,
                t.shares,
                format_currency(t.price),
                t.timestamp.format("%H:%M:%S")
            )
        })
        .collect();
    window.render(&lines.join("\n"))
}

pub fn performance_window(points: &[PerformancePoint]) -> String {
    let window = Window::titled("Performance").icon("📊");
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return window.render("Данных пока нет.");
    };

    let change = last.portfolio_value - first.portfolio_value;
    let change_pct = if first.portfolio_value.is_zero() {
        Decimal::ZERO
    } else {
        change / first.portfolio_value * Decimal::ONE_HUNDRED
    };
    let body = format!(
        "Точек: {}\n{} → {}\nПортфель: {} → {}\nИзменение: {} ({})\nКэш: {}\nПозиция: {}",
        points.len(),
        first.timestamp.format("%H:%M"),
        last.timestamp.format("%H:%M"),
        format_currency(first.portfolio_value),
        format_currency(last.portfolio_value),
        format_currency(change),
        format_percent(change_pct),
        format_currency(last.cash),
        format_currency(last.position_value),
    );
    window.render(&body)
}

pub fn live_message_line(msg: &LiveMessage) -> String {
    let icon = match msg.kind {
        MessageKind::System => "🤖",
        MessageKind::Buy => "🟢",
        MessageKind::Sell => "🔴",
    };
    format!("[{}] {} {}", msg.time_label(), icon, msg.message)
}

pub fn feed_window(feed: &LiveFeed) -> String {
    let lines: Vec<String> = feed.iter().map(live_message_line).collect();
    Window::titled("Live Trading Feed").icon("⚡").render(&lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StalePolicy;
    use crate::models::BotStatus;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn active_state() -> SessionState {
        let mut st = SessionState::new(21);
        st.apply_status(
            1,
            BotStatus {
                status: BotState::Active,
                portfolio_value: dec!(1005.50),
                cash: dec!(500),
                total_profit_loss: dec!(5.50),
                total_profit_loss_pct: dec!(0.55),
                last_action: Some(TradeAction::Buy),
                market_open: true,
            },
            StalePolicy::LastWriteWins,
        );
        st
    }

    #[test]
    fn status_window_shows_money_in_usd() {
        let text = status_window(&active_state());
        assert!(text.contains("● ACTIVE"));
        assert!(text.contains("Портфель: $1,005.50"));
        assert!(text.contains("Кэш: $500.00"));
        assert!(text.contains("P/L: $5.50 (+0.55%)"));
        assert!(text.contains("Сессия: active"));
    }

    #[test]
    fn status_window_without_snapshot() {
        let text = status_window(&SessionState::new(21));
        assert!(text.contains("uninitialized"));
    }

    #[test]
    fn trades_window_limits_rows() {
        let ts = Utc.with_ymd_and_hms(2025, 3, 14, 14, 30, 5).unwrap();
        let trades: Vec<_> = (0..5)
            .map(|_| TradeRecord { action: TradeAction::Sell, shares: dec!(2), price: dec!(187.25), timestamp: ts })
            .collect();
        let text = trades_window(&trades);
        assert_eq!(text.matches("SELL 2 shares @ $187.25").count(), 3);
        assert!(text.contains("14:30:05"));
    }

    #[test]
    fn performance_window_summarises_series() {
        let p = |h, v| PerformancePoint {
            timestamp: Utc.with_ymd_and_hms(2025, 3, 14, h, 0, 0).unwrap(),
            portfolio_value: v,
            cash: dec!(400),
            position_value: v - dec!(400),
        };
        let text = performance_window(&[p(10, dec!(1000)), p(11, dec!(990)), p(12, dec!(1050))]);
        assert!(text.contains("Точек: 3"));
        assert!(text.contains("Изменение: $50.00 (+5.00%)"));
        assert!(performance_window(&[]).contains("Данных пока нет"));
    }

    #[test]
    fn feed_window_lists_entries_in_order() {
        let text = feed_window(&active_state().feed);
        let opened = text.find("Trading bot panel opened").unwrap();
        let buy = text.find("BUY executed").unwrap();
        assert!(opened < buy);
    }
}
