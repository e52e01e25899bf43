use anyhow::Result;
use teloxide::Bot;

use botpanel::api::{BotApi, HttpBotApi};
use botpanel::{config, logger, telegram};

#[tokio::main]
async fn main() -> Result<()> {
    // 1) .env, конфиг и логгер
    dotenv::dotenv().ok();
    let cfg = config::Config::load()?;
    logger::init(&cfg);

    // 2) клиент сервиса бота + пробный запрос статуса
    let api = HttpBotApi::new(&cfg.api_base_url, cfg.http_timeout())?;
    match api.status().await {
        Ok(status) => tracing::info!("Bot service reachable, status = {}", status.status),
        // сервис может "спать", опрос сам подхватит его позже
        Err(e) => tracing::warn!("Bot service is not reachable yet: {:#}", e),
    }

    // 3) Telegram‑бот и диспетчер
    let bot = Bot::new(&cfg.telegram_token);
    telegram::run(bot, api, cfg).await;
    Ok(())
}
