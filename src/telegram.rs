// src/telegram.rs

use crate::api::BotApi;
use crate::config::Config;
use crate::notifier::{
    Command, SessionStorage, StateStorage, handle_callback, handle_command, handle_message,
    spawn_idle_reaper,
};
use std::collections::HashMap;
use std::sync::Arc;
use teloxide::{
    dptree,
    prelude::*,
    types::{CallbackQuery, Message},
};
use tokio::sync::{Mutex as TokioMutex, RwLock as TokioRwLock};

pub async fn run<A>(bot: Bot, api: A, cfg: Config)
where
    A: BotApi + 'static,
{
    let api = Arc::new(api);
    let cfg = Arc::new(cfg);
    let state_storage: StateStorage = Arc::new(TokioRwLock::new(HashMap::new()));
    let sessions: SessionStorage<A> = Arc::new(TokioMutex::new(HashMap::new()));
    // панели без обращений не должны опрашивать сервис вечно
    let _reaper = spawn_idle_reaper(sessions.clone(), cfg.session_idle());

    // 1) Текстовые команды
    let commands_branch = Update::filter_message()
        .filter_command::<Command>()
        .endpoint({
            let api = api.clone();
            let state_storage = state_storage.clone();
            let sessions = sessions.clone();
            let cfg = cfg.clone();
            move |bot: Bot, msg: Message, cmd: Command| {
                let api = api.clone();
                let state_storage = state_storage.clone();
                let sessions = sessions.clone();
                let cfg = cfg.clone();
                async move {
                    if let Err(err) = handle_command(bot, msg, cmd, api, state_storage, sessions, cfg).await {
                        tracing::error!("command handler error: {:?}", err);
                    }
                    respond(())
                }
            }
        });

    // 2) Inline‑callbacks
    let callback_branch = Update::filter_callback_query()
        .endpoint({
            let api = api.clone();
            let state_storage = state_storage.clone();
            let sessions = sessions.clone();
            let cfg = cfg.clone();
            move |bot: Bot, q: CallbackQuery| {
                let api = api.clone();
                let state_storage = state_storage.clone();
                let sessions = sessions.clone();
                let cfg = cfg.clone();
                async move {
                    if let Err(err) = handle_callback(bot, q, api, state_storage, sessions, cfg).await {
                        tracing::error!("callback handler error: {:?}", err);
                    }
                    respond(())
                }
            }
        });

    // 3) Текстовые сообщения (диалог инициализации)
    let message_branch = Update::filter_message()
        .endpoint({
            let api = api.clone();
            let state_storage = state_storage.clone();
            let sessions = sessions.clone();
            let cfg = cfg.clone();
            move |bot: Bot, msg: Message| {
                let api = api.clone();
                let state_storage = state_storage.clone();
                let sessions = sessions.clone();
                let cfg = cfg.clone();
                async move {
                    if let Err(err) = handle_message(bot, msg, api, state_storage, sessions, cfg).await {
                        tracing::error!("message handler error: {:?}", err);
                    }
                    respond(())
                }
            }
        });

    // Собираем все ветки в Dispatcher
    Dispatcher::builder(bot, dptree::entry()
        .branch(commands_branch)
        .branch(callback_branch)
        .branch(message_branch))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}
