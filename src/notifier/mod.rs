pub mod callbacks;
pub mod commands;
pub mod messages;
pub mod navigation;
pub mod render;
pub mod window;

// Экспорт всех необходимых типов и функций
pub use self::callbacks::handle_callback;
pub use self::commands::handle_command;
pub use self::messages::handle_message;

use crate::api::BotApi;
use crate::config::Config;
use crate::session::{Session, SessionSettings};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use teloxide::prelude::*;
use teloxide::types::ChatId;
use teloxide::utils::command::BotCommands;
use tokio::sync::{Mutex as TokioMutex, RwLock as TokioRwLock, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval};
use tracing::{info, warn};

/// Состояние диалога инициализации
#[derive(Debug, Clone)]
pub enum UserState {
    AwaitingApiKey { last_bot_message_id: Option<i32> },
    AwaitingApiSecret { api_key: String, last_bot_message_id: Option<i32> },
    None,
}

/// Тип для хранения состояний пользователей
pub type StateStorage = Arc<TokioRwLock<HashMap<ChatId, UserState>>>;

/// Сессия панели, привязанная к чату
pub struct ChatSession<A> {
    pub session: Session<A>,
    watching: Arc<AtomicBool>,
    last_used: TokioMutex<Instant>,
}

impl<A> ChatSession<A> {
    async fn touch(&self) {
        *self.last_used.lock().await = Instant::now();
    }

    async fn idle_for(&self) -> Duration {
        self.last_used.lock().await.elapsed()
    }

    pub fn is_watching(&self) -> bool {
        self.watching.load(Ordering::SeqCst)
    }

    pub fn set_watching(&self, on: bool) {
        self.watching.store(on, Ordering::SeqCst);
    }
}

/// Открытые сессии по чатам. Сессия удаляется из карты по /close,
/// и вместе с ней останавливается таймер опроса.
pub type SessionStorage<A> = Arc<TokioMutex<HashMap<ChatId, Arc<ChatSession<A>>>>>;

/// Возвращает сессию чата, открывая новую при необходимости
pub async fn get_or_open_session<A>(
    bot: &Bot,
    chat_id: ChatId,
    api: &Arc<A>,
    cfg: &Config,
    sessions: &SessionStorage<A>,
) -> Arc<ChatSession<A>>
where
    A: BotApi + 'static,
{
    let mut guard = sessions.lock().await;
    if let Some(existing) = guard.get(&chat_id) {
        existing.touch().await;
        return existing.clone();
    }

    let watching = Arc::new(AtomicBool::new(false));
    let (tx, mut rx) = mpsc::unbounded_channel();
    let session = Session::open(api.clone(), SessionSettings::from_config(cfg), Some(tx));

    // Пересылка живой ленты в чат; завершается вместе с сессией
    let bot_fwd = bot.clone();
    let watching_fwd = watching.clone();
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if !watching_fwd.load(Ordering::SeqCst) {
                continue;
            }
            if let Err(e) = bot_fwd.send_message(chat_id, render::live_message_line(&msg)).await {
                warn!("Failed to push live message to {}: {}", chat_id, e);
            }
        }
    });

    info!("Opened control panel session for chat_id: {}", chat_id);
    let chat_session = Arc::new(ChatSession {
        session,
        watching,
        last_used: TokioMutex::new(Instant::now()),
    });
    guard.insert(chat_id, chat_session.clone());
    chat_session
}

pub async fn close_session<A>(chat_id: ChatId, sessions: &SessionStorage<A>) -> bool {
    let removed = sessions.lock().await.remove(&chat_id);
    if removed.is_some() {
        info!("Closed control panel session for chat_id: {}", chat_id);
    }
    removed.is_some()
}

/// Закрывает сессии без обращений дольше `max_idle`.
/// Чаты с включённой лентой (/watch) остаются открытыми.
pub async fn close_idle_sessions<A>(sessions: &SessionStorage<A>, max_idle: Duration) -> usize {
    let mut guard = sessions.lock().await;
    let mut expired = Vec::new();
    for (chat_id, chat) in guard.iter() {
        if !chat.is_watching() && chat.idle_for().await >= max_idle {
            expired.push(*chat_id);
        }
    }
    for chat_id in &expired {
        guard.remove(chat_id);
        info!("Closed idle control panel session for chat_id: {}", chat_id);
    }
    expired.len()
}

/// Фоновая уборка простаивающих сессий
pub fn spawn_idle_reaper<A>(sessions: SessionStorage<A>, max_idle: Duration) -> JoinHandle<()>
where
    A: BotApi + 'static,
{
    let period = max_idle.min(Duration::from_secs(60));
    tokio::spawn(async move {
        let mut timer = interval(period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            timer.tick().await;
            close_idle_sessions(&sessions, max_idle).await;
        }
    })
}

/// Все доступные команды бота
#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Доступные команды:")]
pub enum Command {
    #[command(description = "главное меню")]
    Start,
    #[command(description = "показать это сообщение", aliases = ["?"])]
    Help,
    #[command(description = "открыть панель управления ботом")]
    Panel,
    #[command(description = "текущий статус бота")]
    Status,
    #[command(description = "инициализировать: /init [key secret [ticker] [interval] [capital]]")]
    Init(String),
    #[command(description = "запустить торговлю")]
    Run,
    #[command(description = "остановить торговлю")]
    Halt,
    #[command(description = "последние сделки")]
    Trades,
    #[command(description = "доходность портфеля")]
    Performance,
    #[command(description = "живая лента событий")]
    Feed,
    #[command(description = "присылать новые события в чат")]
    Watch,
    #[command(description = "не присылать события")]
    Unwatch,
    #[command(description = "закрыть панель и остановить опрос")]
    Close,
}

impl Command {
    /// Имя команды без аргументов
    pub fn name(&self) -> &'static str {
        match self {
            Command::Start => "start",
            Command::Help => "help",
            Command::Panel => "panel",
            Command::Status => "status",
            Command::Init(_) => "init",
            Command::Run => "run",
            Command::Halt => "halt",
            Command::Trades => "trades",
            Command::Performance => "performance",
            Command::Feed => "feed",
            Command::Watch => "watch",
            Command::Unwatch => "unwatch",
            Command::Close => "close",
        }
    }
}

// В аргументах /init приходят ключи Alpaca, в логи они не попадают
impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Init(args) if !args.trim().is_empty() => f.write_str("/init <redacted>"),
            other => write!(f, "/{}", other.name()),
        }
    }
}

/// Данные inline‑кнопок
pub mod callback_data {
    pub const MENU_PANEL: &str = "menu_panel";
    pub const MENU_INIT: &str = "menu_init";
    pub const MENU_TRADES: &str = "menu_trades";
    pub const MENU_PERFORMANCE: &str = "menu_performance";
    pub const MENU_FEED: &str = "menu_feed";
    pub const PANEL_START: &str = "panel_start";
    pub const PANEL_STOP: &str = "panel_stop";
    pub const PANEL_REFRESH: &str = "panel_refresh";
    pub const CANCEL_INIT: &str = "cancel_init";
    pub const BACK_TO_MAIN: &str = "back_to_main";
}
