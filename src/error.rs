// src/error.rs
use thiserror::Error;

/// Ошибки команд управления ботом. Все три показываются пользователю
/// одним сообщением и не завершают сессию.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControlError {
    /// Проверка до отправки запроса
    #[error("{0}")]
    Validation(String),
    /// Запрос не дошёл или ответ не разобран
    #[error("transport error: {0}")]
    Transport(String),
    /// Сервис ответил, но сообщил об ошибке
    #[error("{0}")]
    RemoteRejection(String),
}

impl ControlError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ControlError::Validation(msg.into())
    }
}

impl From<reqwest::Error> for ControlError {
    fn from(e: reqwest::Error) -> Self {
        ControlError::Transport(e.to_string())
    }
}
