// src/notifier/commands.rs

use super::{
    Command, SessionStorage, StateStorage, UserState, callback_data, close_session,
    get_or_open_session, navigation, render,
};
use crate::api::BotApi;
use crate::config::Config;
use crate::error::ControlError;
use crate::models::BotConfig;
use crate::session::CommandOutcome;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{ChatId, InlineKeyboardButton, InlineKeyboardMarkup, MessageId};
use teloxide::utils::command::BotCommands;
use tracing::{info, warn};

/// Форма инициализации со значениями из конфига
pub fn default_bot_config(cfg: &Config, api_key: &str, api_secret: &str) -> BotConfig {
    BotConfig {
        model_path: cfg.default_model_path.clone(),
        alpaca_key: api_key.to_string(),
        alpaca_secret: api_secret.to_string(),
        ticker: cfg.default_ticker.clone(),
        check_interval: cfg.default_check_interval,
        initial_value: cfg.default_initial_value,
    }
}

/// `/init <key> <secret> [ticker] [interval] [capital]`
pub fn parse_init_args(args: &str, cfg: &Config) -> Result<BotConfig, ControlError> {
    let parts: Vec<&str> = args.split_whitespace().collect();
    if parts.len() < 2 {
        return Err(ControlError::validation("Please enter your Alpaca API credentials"));
    }
    if parts.len() > 5 {
        return Err(ControlError::validation(
            "usage: /init <key> <secret> [ticker] [interval] [capital]",
        ));
    }

    let mut config = default_bot_config(cfg, parts[0], parts[1]);
    if let Some(ticker) = parts.get(2) {
        config.ticker = ticker.to_uppercase();
    }
    if let Some(interval) = parts.get(3) {
        config.check_interval = interval
            .parse::<u64>()
            .map_err(|_| ControlError::validation(format!("invalid interval `{}`", interval)))?;
    }
    if let Some(capital) = parts.get(4) {
        config.initial_value = Decimal::from_str(capital)
            .map_err(|_| ControlError::validation(format!("invalid capital `{}`", capital)))?;
    }
    Ok(config)
}

/// Текст ответа на команду управления
pub fn outcome_text(result: &Result<CommandOutcome, ControlError>, done: &str) -> String {
    match result {
        Ok(CommandOutcome::Sent) => format!("✅ {}", done),
        Ok(CommandOutcome::Skipped(reason)) => format!("ℹ️ Команда не отправлена: {}", reason),
        Err(ControlError::Validation(msg)) => format!("⚠️ {}", msg),
        Err(e @ ControlError::Transport(_)) => format!("❌ Ошибка связи: {}", e),
        Err(ControlError::RemoteRejection(msg)) => format!("❌ Error: {}", msg),
    }
}

// Удаляет сообщение пользователя (в нём могут быть ключи)
async fn delete_user_message(bot: &Bot, chat_id: ChatId, message_id: MessageId) {
    if let Err(e) = bot.delete_message(chat_id, message_id).await {
        warn!("Failed to delete user message {}: {}", message_id.0, e);
    }
}

// Основной обработчик команд
pub async fn handle_command<A>(
    bot: Bot,
    msg: Message,
    cmd: Command,
    api: Arc<A>,
    state_storage: StateStorage,
    sessions: SessionStorage<A>,
    cfg: Arc<Config>,
) -> anyhow::Result<()>
where
    A: BotApi + 'static,
{
    let chat_id = msg.chat.id;

    // Новая команда прерывает незаконченный диалог
    {
        let mut state_guard = state_storage.write().await;
        if !matches!(state_guard.get(&chat_id), Some(UserState::None) | None) {
            info!("Resetting user state for {} due to new command /{}", chat_id, cmd.name());
            state_guard.insert(chat_id, UserState::None);
        }
    }

    match cmd {
        Command::Start => {
            navigation::show_main_menu(&bot, chat_id, None).await?;
        }
        Command::Help => {
            bot.send_message(chat_id, Command::descriptions().to_string()).await?;
        }
        Command::Panel | Command::Status => {
            let chat = get_or_open_session(&bot, chat_id, &api, &cfg, &sessions).await;
            if matches!(cmd, Command::Panel) {
                chat.session.refresh().await;
                navigation::show_panel(&bot, chat_id, &chat, None).await?;
            } else {
                let snapshot = chat.session.fresh_snapshot().await;
                bot.send_message(chat_id, render::status_window(&snapshot)).await?;
            }
        }
        Command::Init(args) => {
            let args = args.trim().to_string();
            if args.is_empty() {
                let kb = InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
                    "❌ Отмена",
                    callback_data::CANCEL_INIT,
                )]]);
                let bot_msg = bot
                    .send_message(chat_id, "Введите Alpaca API key:")
                    .reply_markup(kb)
                    .await?;
                state_storage.write().await.insert(
                    chat_id,
                    UserState::AwaitingApiKey { last_bot_message_id: Some(bot_msg.id.0) },
                );
                return Ok(());
            }

            delete_user_message(&bot, chat_id, msg.id).await;
            let chat = get_or_open_session(&bot, chat_id, &api, &cfg, &sessions).await;
            let result = match parse_init_args(&args, &cfg) {
                Ok(config) => chat.session.controller().initialize(config).await,
                Err(e) => Err(e),
            };
            bot.send_message(chat_id, outcome_text(&result, "Bot initialized successfully!")).await?;
            if result.is_ok() {
                navigation::show_panel(&bot, chat_id, &chat, None).await?;
            }
        }
        Command::Run | Command::Halt => {
            let chat = get_or_open_session(&bot, chat_id, &api, &cfg, &sessions).await;
            let (result, done) = if matches!(cmd, Command::Run) {
                (chat.session.controller().start().await, "Бот запущен")
            } else {
                (chat.session.controller().stop().await, "Бот остановлен")
            };
            bot.send_message(chat_id, outcome_text(&result, done)).await?;
            navigation::show_panel(&bot, chat_id, &chat, None).await?;
        }
        Command::Trades | Command::Performance | Command::Feed => {
            let chat = get_or_open_session(&bot, chat_id, &api, &cfg, &sessions).await;
            let snapshot = chat.session.fresh_snapshot().await;
            let text = match cmd {
                Command::Trades => render::trades_window(&snapshot.trades),
                Command::Performance => render::performance_window(&snapshot.performance),
                _ => render::feed_window(&snapshot.feed),
            };
            bot.send_message(chat_id, text).await?;
        }
        Command::Watch | Command::Unwatch => {
            let chat = get_or_open_session(&bot, chat_id, &api, &cfg, &sessions).await;
            let on = matches!(cmd, Command::Watch);
            chat.set_watching(on);
            let text = if on {
                "⚡ Новые сделки будут приходить в этот чат."
            } else {
                "🔕 Лента отключена."
            };
            bot.send_message(chat_id, text).await?;
        }
        Command::Close => {
            let text = if close_session(chat_id, &sessions).await {
                "Панель закрыта, опрос остановлен."
            } else {
                "Панель не была открыта."
            };
            bot.send_message(chat_id, text).await?;
        }
    }

    Ok(())
}
