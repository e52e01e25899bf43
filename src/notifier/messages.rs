// src/notifier/messages.rs

use super::commands::{default_bot_config, outcome_text};
use super::{SessionStorage, StateStorage, UserState, callback_data, get_or_open_session, navigation};
use crate::api::BotApi;
use crate::config::Config;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, MessageId};
use tracing::warn;

/// Диалог инициализации: ключ, затем секрет
pub async fn handle_message<A>(
    bot: Bot,
    msg: Message,
    api: Arc<A>,
    state_storage: StateStorage,
    sessions: SessionStorage<A>,
    cfg: Arc<Config>,
) -> anyhow::Result<()>
where
    A: BotApi + 'static,
{
    let chat_id = msg.chat.id;
    let text = msg.text().unwrap_or("").trim().to_string();

    let user_state = state_storage.read().await.get(&chat_id).cloned();
    let Some(user_state) = user_state.filter(|s| !matches!(s, UserState::None)) else {
        bot.send_message(chat_id, "Сейчас нет активного диалога. Используйте /start.")
            .await?;
        return Ok(());
    };

    // Сообщение с ключом не должно оставаться в чате
    if let Err(e) = bot.delete_message(chat_id, msg.id).await {
        warn!("Failed to delete user message {}: {}", msg.id.0, e);
    }

    match user_state {
        UserState::AwaitingApiKey { last_bot_message_id } => {
            if text.is_empty() {
                bot.send_message(chat_id, "Ключ не может быть пустым. Введите Alpaca API key:")
                    .await?;
                return Ok(());
            }
            let kb = InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
                "❌ Отмена",
                callback_data::CANCEL_INIT,
            )]]);
            let prompt = "Введите Alpaca API secret:";
            let bot_msg_id = match last_bot_message_id {
                Some(id) => {
                    bot.edit_message_text(chat_id, MessageId(id), prompt)
                        .reply_markup(kb)
                        .await?;
                    id
                }
                None => bot.send_message(chat_id, prompt).reply_markup(kb).await?.id.0,
            };
            state_storage.write().await.insert(
                chat_id,
                UserState::AwaitingApiSecret {
                    api_key: text,
                    last_bot_message_id: Some(bot_msg_id),
                },
            );
        }
        UserState::AwaitingApiSecret { api_key, last_bot_message_id } => {
            state_storage.write().await.insert(chat_id, UserState::None);

            let chat = get_or_open_session(&bot, chat_id, &api, &cfg, &sessions).await;
            let config = default_bot_config(&cfg, &api_key, &text);
            let result = chat.session.controller().initialize(config).await;
            let reply = outcome_text(&result, "Bot initialized successfully!");

            match last_bot_message_id {
                Some(id) => {
                    bot.edit_message_text(chat_id, MessageId(id), reply).await?;
                }
                None => {
                    bot.send_message(chat_id, reply).await?;
                }
            }
            if result.is_ok() {
                navigation::show_panel(&bot, chat_id, &chat, None).await?;
            }
        }
        UserState::None => {}
    }

    Ok(())
}
