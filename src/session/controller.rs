// src/session/controller.rs

use super::live_feed::LiveMessage;
use super::poller::StatusPoller;
use super::state::{Lifecycle, SharedState};
use crate::api::BotApi;
use crate::error::ControlError;
use crate::models::{BotConfig, BotState};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, warn};

/// Результат команды, прошедшей клиентские проверки
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Sent,
    /// Команда не отправлена: по последнему опросу она ничего не изменит
    Skipped(&'static str),
}

/// Проверка формы до любого сетевого запроса
pub fn validate_config(config: &BotConfig) -> Result<(), ControlError> {
    if config.alpaca_key.trim().is_empty() || config.alpaca_secret.trim().is_empty() {
        return Err(ControlError::validation("Please enter your Alpaca API credentials"));
    }
    if config.check_interval == 0 {
        return Err(ControlError::validation("check interval must be greater than zero"));
    }
    if config.initial_value <= Decimal::ZERO {
        return Err(ControlError::validation("initial capital must be positive"));
    }
    Ok(())
}

/// Команды initialize / start / stop
pub struct LifecycleController<A> {
    api: Arc<A>,
    state: SharedState,
    poller: StatusPoller<A>,
}

impl<A> LifecycleController<A>
where
    A: BotApi + 'static,
{
    pub fn new(api: Arc<A>, state: SharedState, poller: StatusPoller<A>) -> Self {
        Self { api, state, poller }
    }

    pub async fn lifecycle(&self) -> Lifecycle {
        self.state.lock().await.lifecycle
    }

    /// Кнопка Start активна, только если бот ещё не запущен
    pub async fn can_start(&self) -> bool {
        let st = self.state.lock().await;
        st.observed_state() != Some(BotState::Active)
            && matches!(st.lifecycle, Lifecycle::InitializedIdle | Lifecycle::Stopped)
    }

    pub async fn can_stop(&self) -> bool {
        let st = self.state.lock().await;
        st.observed_state() != Some(BotState::Stopped)
            && matches!(st.lifecycle, Lifecycle::Active | Lifecycle::InitializedIdle | Lifecycle::Error)
    }

    pub async fn initialize(&self, config: BotConfig) -> Result<CommandOutcome, ControlError> {
        validate_config(&config)?;
        if self.lifecycle().await != Lifecycle::Uninitialized {
            return Err(ControlError::validation("bot is already initialized"));
        }

        info!("Initializing bot: ticker = {}, model = {}", config.ticker, config.model_path);
        if let Err(e) = self.api.initialize(&config).await {
            warn!("Bot initialization failed: {}", e);
            return Err(e);
        }

        {
            let mut st = self.state.lock().await;
            // опрос мог успеть увидеть бота раньше нас
            if st.lifecycle == Lifecycle::Uninitialized {
                st.lifecycle = Lifecycle::InitializedIdle;
            }
        }
        self.poller
            .announce(LiveMessage::system(format!("Bot initialized for {}", config.ticker)))
            .await;
        self.poller.poll_once().await;
        Ok(CommandOutcome::Sent)
    }

    pub async fn start(&self) -> Result<CommandOutcome, ControlError> {
        {
            let st = self.state.lock().await;
            if st.observed_state() == Some(BotState::Active) {
                return Ok(CommandOutcome::Skipped("bot is already active"));
            }
            match st.lifecycle {
                Lifecycle::InitializedIdle | Lifecycle::Stopped => {}
                Lifecycle::Active => return Ok(CommandOutcome::Skipped("bot is already active")),
                Lifecycle::Uninitialized => return Err(ControlError::validation("bot is not initialized")),
                Lifecycle::Error => return Err(ControlError::validation("bot is in error state")),
            }
        }

        info!("Sending start command");
        if let Err(e) = self.api.start().await {
            warn!("Start command failed: {}", e);
            return Err(e);
        }
        self.poller.announce(LiveMessage::system("Start command accepted")).await;
        // переход увидим через опрос
        self.poller.poll_once().await;
        Ok(CommandOutcome::Sent)
    }

    pub async fn stop(&self) -> Result<CommandOutcome, ControlError> {
        {
            let st = self.state.lock().await;
            if st.observed_state() == Some(BotState::Stopped) {
                return Ok(CommandOutcome::Skipped("bot is already stopped"));
            }
            match st.lifecycle {
                Lifecycle::Active | Lifecycle::InitializedIdle | Lifecycle::Error => {}
                Lifecycle::Stopped => return Ok(CommandOutcome::Skipped("bot is already stopped")),
                Lifecycle::Uninitialized => return Err(ControlError::validation("bot is not initialized")),
            }
        }

        info!("Sending stop command");
        if let Err(e) = self.api.stop().await {
            warn!("Stop command failed: {}", e);
            return Err(e);
        }
        self.poller.announce(LiveMessage::system("Stop command accepted")).await;
        self.poller.poll_once().await;
        Ok(CommandOutcome::Sent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StalePolicy;
    use crate::session::poller::PollSettings;
    use crate::session::live_feed::MessageKind;
    use crate::session::state::SessionState;
    use crate::session::test_support::{ScriptedApi, bot_config, status};
    use rust_decimal_macros::dec;
    use std::time::Duration;

    fn controller(api: &Arc<ScriptedApi>) -> (LifecycleController<ScriptedApi>, SharedState) {
        let state = SessionState::shared(21);
        let settings = PollSettings {
            interval: Duration::from_secs(5),
            stale_policy: StalePolicy::LastWriteWins,
            dashboard: None,
        };
        let poller = StatusPoller::new(api.clone(), state.clone(), settings, None);
        (LifecycleController::new(api.clone(), state.clone(), poller), state)
    }

    #[tokio::test]
    async fn empty_credentials_never_reach_the_network() {
        let api = Arc::new(ScriptedApi::default());
        let (ctl, _) = controller(&api);

        for (key, secret) in [("", "secret"), ("key", ""), ("  ", "secret")] {
            let err = ctl.initialize(bot_config(key, secret)).await.unwrap_err();
            assert!(matches!(err, ControlError::Validation(_)));
        }
        assert!(api.calls().is_empty());
        assert_eq!(ctl.lifecycle().await, Lifecycle::Uninitialized);
    }

    #[tokio::test]
    async fn bad_interval_or_capital_is_rejected() {
        let api = Arc::new(ScriptedApi::default());
        let (ctl, _) = controller(&api);

        let mut cfg = bot_config("key", "secret");
        cfg.check_interval = 0;
        assert!(matches!(ctl.initialize(cfg).await, Err(ControlError::Validation(_))));

        let mut cfg = bot_config("key", "secret");
        cfg.initial_value = dec!(-5);
        assert!(matches!(ctl.initialize(cfg).await, Err(ControlError::Validation(_))));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn successful_init_moves_to_idle_and_refreshes() {
        let api = Arc::new(ScriptedApi::default());
        api.push_status(status(BotState::Stopped, dec!(1000), None));
        let (ctl, state) = controller(&api);

        let outcome = ctl.initialize(bot_config("key", "secret")).await.unwrap();
        assert_eq!(outcome, CommandOutcome::Sent);
        assert_eq!(api.calls(), vec!["initialize", "status"]);
        assert_eq!(ctl.lifecycle().await, Lifecycle::InitializedIdle);
        assert!(state.lock().await.status.is_some());
        assert!(ctl.can_start().await);
        assert!(!ctl.can_stop().await);
    }

    #[tokio::test]
    async fn rejected_init_stays_uninitialized_with_remote_message() {
        let api = Arc::new(ScriptedApi::default());
        api.set_init(Err(ControlError::RemoteRejection("invalid Alpaca credentials".into())));
        let (ctl, _) = controller(&api);

        let err = ctl.initialize(bot_config("key", "secret")).await.unwrap_err();
        assert_eq!(err.to_string(), "invalid Alpaca credentials");
        assert_eq!(ctl.lifecycle().await, Lifecycle::Uninitialized);
        assert_eq!(api.calls(), vec!["initialize"]);
    }

    #[tokio::test]
    async fn second_init_is_a_validation_error() {
        let api = Arc::new(ScriptedApi::default());
        api.push_status(status(BotState::Stopped, dec!(1000), None));
        let (ctl, _) = controller(&api);

        ctl.initialize(bot_config("key", "secret")).await.unwrap();
        let err = ctl.initialize(bot_config("key", "secret")).await.unwrap_err();
        assert!(matches!(err, ControlError::Validation(_)));
        assert_eq!(api.count("initialize"), 1);
    }

    #[tokio::test]
    async fn start_is_noop_when_already_active() {
        let api = Arc::new(ScriptedApi::default());
        api.push_status(status(BotState::Active, dec!(1000), None));
        let (ctl, _) = controller(&api);
        ctl.poller.poll_once().await;

        let outcome = ctl.start().await.unwrap();
        assert!(matches!(outcome, CommandOutcome::Skipped(_)));
        assert_eq!(api.count("start"), 0);
        assert!(!ctl.can_start().await);
    }

    #[tokio::test]
    async fn stop_is_noop_when_already_stopped() {
        let api = Arc::new(ScriptedApi::default());
        api.push_status(status(BotState::Stopped, dec!(1000), None));
        let (ctl, _) = controller(&api);
        ctl.initialize(bot_config("key", "secret")).await.unwrap();

        let outcome = ctl.stop().await.unwrap();
        assert!(matches!(outcome, CommandOutcome::Skipped(_)));
        assert_eq!(api.count("stop"), 0);
    }

    #[tokio::test]
    async fn start_then_stop_follow_polled_status() {
        let api = Arc::new(ScriptedApi::default());
        api.push_status(status(BotState::Stopped, dec!(1000), None));
        api.push_status(status(BotState::Active, dec!(1000), None));
        api.push_status(status(BotState::Stopped, dec!(1010), None));
        let (ctl, _) = controller(&api);

        ctl.initialize(bot_config("key", "secret")).await.unwrap();
        assert_eq!(ctl.start().await.unwrap(), CommandOutcome::Sent);
        assert_eq!(ctl.lifecycle().await, Lifecycle::Active);
        assert_eq!(ctl.stop().await.unwrap(), CommandOutcome::Sent);
        assert_eq!(ctl.lifecycle().await, Lifecycle::Stopped);
        assert!(ctl.can_start().await);
        assert_eq!(
            api.calls(),
            vec!["initialize", "status", "start", "status", "stop", "status"]
        );
    }

    #[tokio::test]
    async fn failed_start_leaves_state_unchanged() {
        let api = Arc::new(ScriptedApi::default());
        api.push_status(status(BotState::Stopped, dec!(1000), None));
        api.set_start(Err(ControlError::Transport("connection reset".into())));
        let (ctl, _) = controller(&api);
        ctl.initialize(bot_config("key", "secret")).await.unwrap();

        let err = ctl.start().await.unwrap_err();
        assert!(matches!(err, ControlError::Transport(_)));
        assert_eq!(ctl.lifecycle().await, Lifecycle::InitializedIdle);
        assert_eq!(api.status_calls(), 1);
    }

    #[tokio::test]
    async fn failed_stop_leaves_state_unchanged() {
        let api = Arc::new(ScriptedApi::default());
        api.push_status(status(BotState::Active, dec!(1000), None));
        api.set_stop(Err(ControlError::RemoteRejection("Bot is not running".into())));
        let (ctl, state) = controller(&api);
        ctl.poller.poll_once().await;
        let feed_before = state.lock().await.feed.len();

        let err = ctl.stop().await.unwrap_err();
        assert_eq!(err, ControlError::RemoteRejection("Bot is not running".into()));
        assert_eq!(ctl.lifecycle().await, Lifecycle::Active);
        // без повторного опроса и без записи в ленту
        assert_eq!(api.status_calls(), 1);
        assert_eq!(state.lock().await.feed.len(), feed_before);
        assert!(ctl.can_stop().await);
    }

    #[tokio::test]
    async fn command_messages_reach_watchers() {
        let api = Arc::new(ScriptedApi::default());
        api.push_status(status(BotState::Stopped, dec!(1000), None));
        api.push_status(status(BotState::Active, dec!(1000), None));
        let state = SessionState::shared(21);
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let settings = PollSettings {
            interval: Duration::from_secs(5),
            stale_policy: StalePolicy::LastWriteWins,
            dashboard: None,
        };
        let poller = StatusPoller::new(api.clone(), state.clone(), settings, Some(tx));
        let ctl = LifecycleController::new(api.clone(), state.clone(), poller);

        ctl.initialize(bot_config("key", "secret")).await.unwrap();
        ctl.start().await.unwrap();

        let init = rx.try_recv().unwrap();
        assert_eq!(init.message, "Bot initialized for AAPL");
        assert_eq!(init.kind, MessageKind::System);
        assert_eq!(rx.try_recv().unwrap().message, "Start command accepted");
        assert!(rx.try_recv().is_err());
        assert_eq!(state.lock().await.feed.last().unwrap().message, "Start command accepted");
    }

    #[tokio::test]
    async fn start_before_init_is_rejected_locally() {
        let api = Arc::new(ScriptedApi::default());
        let (ctl, _) = controller(&api);
        assert!(matches!(ctl.start().await, Err(ControlError::Validation(_))));
        assert!(matches!(ctl.stop().await, Err(ControlError::Validation(_))));
        assert!(api.calls().is_empty());
    }
}
