//! REST payloads

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Activity kind for games (as opposed to music)
pub const GAME_DATA_TYPE: u8 = 1;

/// Response envelope shared by every endpoint
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
}

/// `GET /gateway/index`
#[derive(Debug, Deserialize)]
pub struct GatewayData {
    pub url: String,
}

/// A registered game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    pub id: i64,
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: i64,
    #[serde(default)]
    pub icon: String,
}

/// `GET /game`
#[derive(Debug, Deserialize)]
pub struct GameList {
    #[serde(default)]
    pub items: Vec<Game>,
}

/// `GET /user/me`
#[derive(Debug, Clone, Deserialize)]
pub struct CurrentUser {
    pub id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub bot: bool,
}

/// `POST /message/create`
#[derive(Debug, Serialize)]
pub struct CreateMessageRequest<'a> {
    pub channel_id: &'a str,
    pub content: &'a str,
}

/// `POST /game/activity`
#[derive(Debug, Serialize)]
pub struct GameActivityRequest {
    pub id: i64,
    pub data_type: u8,
}

/// `POST /game/delete-activity`
#[derive(Debug, Serialize)]
pub struct DeleteActivityRequest {
    pub data_type: u8,
}

/// Bodies this client does not inspect
pub type Ignored = Value;
