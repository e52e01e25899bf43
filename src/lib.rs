pub mod api;
pub mod config;
pub mod error;
pub mod logger;
pub mod models;
pub mod notifier;
pub mod session;
pub mod telegram;
pub mod utils;
