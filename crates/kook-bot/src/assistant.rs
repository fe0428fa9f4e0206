//! Reply generation
//!
//! The LLM answers first; a message that names one of the game tools then
//! has its reply replaced by the tool's result.

use crate::api::PlatformApi;
use crate::llm::ChatModel;
use std::sync::Arc;
use tracing::{info, warn};

/// Reply used when the LLM is unavailable or fails
pub const LLM_APOLOGY: &str = "抱歉，我暂时无法回答这个问题。";

const LIST_GAMES_KEYWORD: &str = "游戏列表";
const START_GAME_KEYWORD: &str = "开始玩游戏";
const STOP_GAME_KEYWORD: &str = "结束玩游戏";

/// A keyword-triggered tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tool {
    ListGames,
    /// Start playing the named game
    StartGame(String),
    StopGame,
}

impl Tool {
    /// Pick the tool a message asks for, checked in a fixed order
    #[must_use]
    pub fn from_message(message: &str) -> Option<Self> {
        if message.contains(LIST_GAMES_KEYWORD) {
            Some(Self::ListGames)
        } else if message.contains(START_GAME_KEYWORD) {
            let name = message.replace(START_GAME_KEYWORD, "").trim().to_string();
            Some(Self::StartGame(name))
        } else if message.contains(STOP_GAME_KEYWORD) {
            Some(Self::StopGame)
        } else {
            None
        }
    }
}

/// Answers user queries
pub struct Assistant {
    llm: Option<Arc<dyn ChatModel>>,
    platform: Arc<dyn PlatformApi>,
}

impl Assistant {
    #[must_use]
    pub fn new(llm: Option<Arc<dyn ChatModel>>, platform: Arc<dyn PlatformApi>) -> Self {
        Self { llm, platform }
    }

    /// Produce a reply; never fails
    pub async fn reply(&self, user_message: &str) -> String {
        let base = self.ask_llm(user_message).await;

        match Tool::from_message(user_message) {
            Some(tool) => {
                info!(tool = ?tool, "Running tool");
                self.run_tool(tool).await
            }
            None => base,
        }
    }

    async fn ask_llm(&self, user_message: &str) -> String {
        let Some(llm) = &self.llm else {
            return LLM_APOLOGY.to_string();
        };

        match llm.complete(user_message).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "LLM call failed");
                LLM_APOLOGY.to_string()
            }
        }
    }

    async fn run_tool(&self, tool: Tool) -> String {
        match tool {
            Tool::ListGames => match self.platform.list_games().await {
                Ok(games) if !games.is_empty() => {
                    let names: Vec<&str> = games.iter().map(|g| g.name.as_str()).collect();
                    format!("当前游戏列表如下：\n{}", names.join("\n"))
                }
                Ok(_) => "获取游戏列表失败，请稍后再试。".to_string(),
                Err(e) => {
                    warn!(error = %e, "Failed to fetch game list");
                    "获取游戏列表失败，请稍后再试。".to_string()
                }
            },
            Tool::StartGame(name) => {
                let games = self.platform.list_games().await.unwrap_or_else(|e| {
                    warn!(error = %e, "Failed to fetch game list");
                    Vec::new()
                });

                let Some(game) = games.into_iter().find(|g| g.name == name) else {
                    return format!("未找到游戏：{name}。");
                };

                match self.platform.add_game_activity(game.id).await {
                    Ok(()) => format!("已开始玩 {name}。"),
                    Err(e) => {
                        warn!(error = %e, game_id = game.id, "Failed to start game activity");
                        format!("开始玩 {name} 失败。")
                    }
                }
            }
            Tool::StopGame => match self.platform.delete_game_activity().await {
                Ok(()) => "已结束当前游戏。".to_string(),
                Err(e) => {
                    warn!(error = %e, "Failed to stop game activity");
                    "结束游戏失败。".to_string()
                }
            },
        }
    }
}
