//! KOOK REST client
//!
//! Every request carries `Authorization: Bot <token>` and every response is
//! wrapped in `{ code, message, data }`; a non-zero `code` is an error even
//! on HTTP 200.

use super::error::{ApiError, ApiResult};
use super::types::{
    ApiResponse, CreateMessageRequest, CurrentUser, DeleteActivityRequest, Game,
    GameActivityRequest, GameList, GatewayData, Ignored, GAME_DATA_TYPE,
};
use super::PlatformApi;
use async_trait::async_trait;
use kook_common::{BotConfig, GatewayConfig};
use kook_gateway::{EndpointError, EndpointResolver};
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, instrument};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// KOOK REST API client
#[derive(Clone)]
pub struct KookApi {
    client: Client,
    base_url: String,
    gateway_url: String,
    token: String,
}

impl std::fmt::Debug for KookApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KookApi")
            .field("base_url", &self.base_url)
            .field("gateway_url", &self.gateway_url)
            .finish_non_exhaustive()
    }
}

impl KookApi {
    /// Create a client for `base_url` (e.g. `https://www.kookapp.cn/api/v3`)
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> ApiResult<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            gateway_url: format!("{base_url}/gateway/index"),
            base_url,
            token: token.into(),
        })
    }

    /// Create a client from application configuration
    pub fn from_config(bot: &BotConfig, gateway: &GatewayConfig) -> ApiResult<Self> {
        Ok(Self::new(&bot.api_url, &bot.token)?.with_gateway_url(&gateway.url))
    }

    /// Override the endpoint-resolution URL
    #[must_use]
    pub fn with_gateway_url(mut self, url: impl Into<String>) -> Self {
        self.gateway_url = url.into();
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn envelope<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> ApiResult<ApiResponse<T>> {
        let response = request
            .header(AUTHORIZATION, format!("Bot {}", self.token))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| ApiError::decode(e.to_string()))?;

        if envelope.code != 0 {
            return Err(ApiError::Api {
                code: envelope.code,
                message: envelope.message,
            });
        }
        Ok(envelope)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> ApiResult<T> {
        self.envelope(request)
            .await?
            .data
            .ok_or_else(|| ApiError::decode("response has no `data`"))
    }

    async fn send_unit(&self, request: RequestBuilder) -> ApiResult<()> {
        self.envelope::<Ignored>(request).await.map(|_| ())
    }

    /// Resolve the WebSocket URL
    #[instrument(skip(self))]
    pub async fn gateway_url(&self, compress: bool) -> ApiResult<String> {
        let request = self
            .client
            .get(&self.gateway_url)
            .query(&[("compress", u8::from(compress))]);
        let data: GatewayData = self.send(request).await?;

        if data.url.is_empty() {
            return Err(ApiError::decode("gateway url is empty"));
        }
        Ok(data.url)
    }

    /// The bot's own account
    #[instrument(skip(self))]
    pub async fn current_user(&self) -> ApiResult<CurrentUser> {
        self.send(self.client.get(self.url("/user/me"))).await
    }

    /// Games registered on the platform
    #[instrument(skip(self))]
    pub async fn list_games(&self) -> ApiResult<Vec<Game>> {
        let list: GameList = self.send(self.client.get(self.url("/game"))).await?;
        debug!(count = list.items.len(), "Fetched game list");
        Ok(list.items)
    }

    /// Show "playing <game>" on the bot's profile
    #[instrument(skip(self))]
    pub async fn add_game_activity(&self, game_id: i64) -> ApiResult<()> {
        let body = GameActivityRequest {
            id: game_id,
            data_type: GAME_DATA_TYPE,
        };
        self.send_unit(self.client.post(self.url("/game/activity")).json(&body))
            .await
    }

    /// Clear the bot's game activity
    #[instrument(skip(self))]
    pub async fn delete_game_activity(&self) -> ApiResult<()> {
        let body = DeleteActivityRequest {
            data_type: GAME_DATA_TYPE,
        };
        self.send_unit(self.client.post(self.url("/game/delete-activity")).json(&body))
            .await
    }

    /// Post a message to a channel
    #[instrument(skip(self, content))]
    pub async fn create_message(&self, channel_id: &str, content: &str) -> ApiResult<()> {
        let body = CreateMessageRequest {
            channel_id,
            content,
        };
        self.send_unit(self.client.post(self.url("/message/create")).json(&body))
            .await
    }
}

#[async_trait]
impl EndpointResolver for KookApi {
    async fn resolve(&self, compress: bool) -> Result<String, EndpointError> {
        self.gateway_url(compress).await.map_err(EndpointError::from)
    }
}

#[async_trait]
impl PlatformApi for KookApi {
    async fn list_games(&self) -> ApiResult<Vec<Game>> {
        KookApi::list_games(self).await
    }

    async fn add_game_activity(&self, game_id: i64) -> ApiResult<()> {
        KookApi::add_game_activity(self, game_id).await
    }

    async fn delete_game_activity(&self) -> ApiResult<()> {
        KookApi::delete_game_activity(self).await
    }

    async fn create_message(&self, channel_id: &str, content: &str) -> ApiResult<()> {
        KookApi::create_message(self, channel_id, content).await
    }
}
