// src/logger.rs

use crate::config::Config;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt;

/// Логи сервиса панели. Уровень берётся из RUST_LOG.
pub fn init(cfg: &Config) {
    // reqwest/hyper слишком болтливы на debug
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,hyper=warn,reqwest=warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    tracing::info!(
        api = %cfg.api_base_url,
        poll_secs = cfg.poll_interval_secs,
        feed_capacity = cfg.live_feed_capacity,
        stale_policy = ?cfg.stale_policy,
        "Logger initialized"
    );
}
