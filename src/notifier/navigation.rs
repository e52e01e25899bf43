// src/notifier/navigation.rs

use super::{ChatSession, callback_data, render};
use crate::api::BotApi;
use teloxide::prelude::*;
use teloxide::types::{ChatId, InlineKeyboardButton, InlineKeyboardMarkup, MessageId};
use tracing::warn;

const WELCOME_MESSAGE: &str = "Trading Bot Control Center. Выберите действие:";

/// Создает клавиатуру главного меню
pub fn make_main_menu_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            InlineKeyboardButton::callback("🤖 Панель", callback_data::MENU_PANEL),
            InlineKeyboardButton::callback("⚙️ Инициализация", callback_data::MENU_INIT),
        ],
        vec![
            InlineKeyboardButton::callback("📜 Сделки", callback_data::MENU_TRADES),
            InlineKeyboardButton::callback("📊 Доходность", callback_data::MENU_PERFORMANCE),
            InlineKeyboardButton::callback("⚡ Лента", callback_data::MENU_FEED),
        ],
    ])
}

/// Кнопки панели. Start/Stop скрываются, когда команда ничего не изменит.
pub fn make_panel_keyboard(can_start: bool, can_stop: bool) -> InlineKeyboardMarkup {
    let mut controls = Vec::new();
    if can_start {
        controls.push(InlineKeyboardButton::callback("▶️ Start", callback_data::PANEL_START));
    }
    if can_stop {
        controls.push(InlineKeyboardButton::callback("⏹ Stop", callback_data::PANEL_STOP));
    }
    controls.push(InlineKeyboardButton::callback("🔄 Обновить", callback_data::PANEL_REFRESH));

    InlineKeyboardMarkup::new(vec![
        controls,
        vec![InlineKeyboardButton::callback("⬅️ Назад", callback_data::BACK_TO_MAIN)],
    ])
}

pub fn make_back_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        "⬅️ Назад",
        callback_data::BACK_TO_MAIN,
    )]])
}

/// Показывает или редактирует сообщение с главным меню
pub async fn show_main_menu(bot: &Bot, chat_id: ChatId, message_to_edit: Option<MessageId>)
    -> Result<(), teloxide::RequestError>
{
    let kb = make_main_menu_keyboard();
    if let Some(message_id) = message_to_edit {
        match bot.edit_message_text(chat_id, message_id, WELCOME_MESSAGE).reply_markup(kb.clone()).await {
            Ok(_) => return Ok(()),
            Err(e) => warn!("Failed to edit message {} to main menu: {}. Sending new one.", message_id.0, e),
        }
    }
    bot.send_message(chat_id, WELCOME_MESSAGE).reply_markup(kb).await?;
    Ok(())
}

/// Текст и кнопки панели по текущему снимку
pub async fn panel_view<A>(chat: &ChatSession<A>) -> (String, InlineKeyboardMarkup)
where
    A: BotApi + 'static,
{
    let snapshot = chat.session.snapshot().await;
    let ctl = chat.session.controller();
    let kb = make_panel_keyboard(ctl.can_start().await, ctl.can_stop().await);
    (render::status_window(&snapshot), kb)
}

/// Показывает или редактирует сообщение с панелью
pub async fn show_panel<A>(
    bot: &Bot,
    chat_id: ChatId,
    chat: &ChatSession<A>,
    message_to_edit: Option<MessageId>,
) -> Result<(), teloxide::RequestError>
where
    A: BotApi + 'static,
{
    let (text, kb) = panel_view(chat).await;
    if let Some(message_id) = message_to_edit {
        match bot.edit_message_text(chat_id, message_id, text.clone()).reply_markup(kb.clone()).await {
            Ok(_) => return Ok(()),
            Err(e) if e.to_string().contains("not modified") => return Ok(()),
            Err(e) => warn!("Failed to edit panel message {}: {}. Sending new one.", message_id.0, e),
        }
    }
    bot.send_message(chat_id, text).reply_markup(kb).await?;
    Ok(())
}
