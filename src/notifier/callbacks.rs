// src/notifier/callbacks.rs

use super::commands::outcome_text;
use super::{
    SessionStorage, StateStorage, UserState, callback_data, get_or_open_session, navigation, render,
};
use crate::api::BotApi;
use crate::config::Config;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{CallbackQuery, InlineKeyboardButton, InlineKeyboardMarkup};
use tracing::{info, warn};

pub async fn handle_callback<A>(
    bot: Bot,
    q: CallbackQuery,
    api: Arc<A>,
    state_storage: StateStorage,
    sessions: SessionStorage<A>,
    cfg: Arc<Config>,
) -> anyhow::Result<()>
where
    A: BotApi + 'static,
{
    let (Some(data), Some(message)) = (q.data.as_ref(), q.message.as_ref()) else {
        warn!("CallbackQuery without data or message");
        return Ok(());
    };
    let chat_id = message.chat().id;
    let message_id = message.id();

    // Ответ на колбэк сразу, чтобы убрать "часики" на кнопке.
    // Для Start/Stop отвечаем после команды: ошибка уходит в alert.
    let is_panel_command = data == callback_data::PANEL_START || data == callback_data::PANEL_STOP;
    if !is_panel_command {
        let _ = bot.answer_callback_query(q.id.clone()).await;
    }
    info!("Processing '{}' callback for chat_id: {}", data, chat_id);

    match data.as_str() {
        callback_data::BACK_TO_MAIN => {
            navigation::show_main_menu(&bot, chat_id, Some(message_id)).await?;
        }
        callback_data::MENU_PANEL | callback_data::PANEL_REFRESH => {
            let chat = get_or_open_session(&bot, chat_id, &api, &cfg, &sessions).await;
            chat.session.refresh().await;
            navigation::show_panel(&bot, chat_id, &chat, Some(message_id)).await?;
        }
        callback_data::PANEL_START | callback_data::PANEL_STOP => {
            let chat = get_or_open_session(&bot, chat_id, &api, &cfg, &sessions).await;
            let ctl = chat.session.controller();
            let result = if data == callback_data::PANEL_START {
                ctl.start().await
            } else {
                ctl.stop().await
            };
            let answer = bot.answer_callback_query(q.id.clone());
            let answer = match &result {
                // панель остаётся, ошибка во всплывающем окне
                Err(e) => {
                    warn!("Panel command failed for {}: {}", chat_id, e);
                    answer.text(outcome_text(&result, "")).show_alert(true)
                }
                Ok(_) => answer.text(outcome_text(&result, "OK")),
            };
            if let Err(e) = answer.await {
                warn!("Failed to answer callback query: {}", e);
            }
            navigation::show_panel(&bot, chat_id, &chat, Some(message_id)).await?;
        }
        callback_data::MENU_INIT => {
            let kb = InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
                "❌ Отмена",
                callback_data::CANCEL_INIT,
            )]]);
            bot.edit_message_text(chat_id, message_id, "Введите Alpaca API key:")
                .reply_markup(kb)
                .await?;
            state_storage.write().await.insert(
                chat_id,
                UserState::AwaitingApiKey { last_bot_message_id: Some(message_id.0) },
            );
        }
        callback_data::CANCEL_INIT => {
            state_storage.write().await.insert(chat_id, UserState::None);
            navigation::show_main_menu(&bot, chat_id, Some(message_id)).await?;
        }
        callback_data::MENU_TRADES | callback_data::MENU_PERFORMANCE | callback_data::MENU_FEED => {
            let chat = get_or_open_session(&bot, chat_id, &api, &cfg, &sessions).await;
            let snapshot = chat.session.fresh_snapshot().await;
            let text = match data.as_str() {
                callback_data::MENU_TRADES => render::trades_window(&snapshot.trades),
                callback_data::MENU_PERFORMANCE => render::performance_window(&snapshot.performance),
                _ => render::feed_window(&snapshot.feed),
            };
            bot.edit_message_text(chat_id, message_id, text)
                .reply_markup(navigation::make_back_keyboard())
                .await?;
        }
        other => {
            warn!("Unknown callback data: {}", other);
        }
    }

    Ok(())
}
