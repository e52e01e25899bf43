// src/api/http.rs

use super::BotApi;
use crate::error::ControlError;
use crate::models::{
    BotConfig, BotStatus, CommandResponse, PerformancePoint, PerformanceResponse, TradeRecord,
    TradesResponse,
};
use anyhow::{Context, Result, anyhow};
use reqwest::{Client, Method, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

/// HTTP‑клиент сервиса бота
#[derive(Debug, Clone)]
pub struct HttpBotApi {
    client: Client,
    base_url: Url,
}

impl HttpBotApi {
    /// `base_url` может быть с завершающим `/` или без
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        // без `/` на конце join() заменит последний сегмент пути
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        let base_url = Url::parse(&normalized)
            .map_err(|e| anyhow!("Invalid bot API URL `{}`: {}", normalized, e))?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow!("HTTP client build error: {}", e))?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .with_context(|| format!("bad endpoint path `{}`", path))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = self.endpoint(path)?;
        let resp = self.client.get(url).query(query).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow!("GET {} failed: HTTP {}", path, status.as_u16()));
        }
        let bytes = resp.bytes().await?;
        let de = &mut serde_json::Deserializer::from_slice(&bytes);
        serde_path_to_error::deserialize(de)
            .map_err(|e| anyhow!("GET {}: cannot decode `{}`: {}", path, e.path(), e.inner()))
    }

    async fn command(&self, path: &str, body: Option<&BotConfig>) -> Result<(), ControlError> {
        let url = self
            .endpoint(path)
            .map_err(|e| ControlError::Transport(e.to_string()))?;
        let mut req = self.client.request(Method::POST, url);
        if let Some(b) = body {
            req = req.json(b);
        }

        let resp = req.send().await?;
        let http_status = resp.status();
        let bytes = resp.bytes().await?;
        let parsed: Option<CommandResponse> = serde_json::from_slice(&bytes).ok();
        debug!("POST {} -> HTTP {}, parsed = {:?}", path, http_status.as_u16(), parsed);

        match parsed {
            Some(CommandResponse { success: true, .. }) if http_status.is_success() => Ok(()),
            Some(CommandResponse { error: Some(msg), .. }) => Err(ControlError::RemoteRejection(msg)),
            _ if !http_status.is_success() => Err(ControlError::RemoteRejection(format!(
                "HTTP {}",
                http_status.as_u16()
            ))),
            Some(_) => Err(ControlError::RemoteRejection("unknown error".into())),
            None => {
                warn!("POST {}: response body is not JSON", path);
                Err(ControlError::Transport(format!("invalid response body from {}", path)))
            }
        }
    }
}

#[async_trait::async_trait]
impl BotApi for HttpBotApi {
    /// POST /bot/initialize
    async fn initialize(&self, config: &BotConfig) -> Result<(), ControlError> {
        self.command("bot/initialize", Some(config)).await
    }

    /// POST /bot/start
    async fn start(&self) -> Result<(), ControlError> {
        self.command("bot/start", None).await
    }

    /// POST /bot/stop
    async fn stop(&self) -> Result<(), ControlError> {
        self.command("bot/stop", None).await
    }

    /// GET /bot/status
    async fn status(&self) -> Result<BotStatus> {
        self.get_json("bot/status", &[]).await
    }

    /// GET /bot/trades?limit=N
    async fn trades(&self, limit: u32) -> Result<Vec<TradeRecord>> {
        let res: TradesResponse = self
            .get_json("bot/trades", &[("limit", limit.to_string())])
            .await?;
        Ok(res.trades)
    }

    /// GET /bot/performance?limit=N
    async fn performance(&self, limit: u32) -> Result<Vec<PerformancePoint>> {
        let res: PerformanceResponse = self
            .get_json("bot/performance", &[("limit", limit.to_string())])
            .await?;
        Ok(res.performance)
    }
}
