//! Application configuration structs
//!
//! Loads configuration from environment variables and an optional `.env` file.

use serde::Deserialize;
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub bot: BotConfig,
    pub gateway: GatewayConfig,
    pub llm: LlmConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "production" => Some(Self::Production),
            "staging" => Some(Self::Staging),
            "development" => Some(Self::Development),
            _ => None,
        }
    }
}

/// Bot credentials and REST API location
#[derive(Clone, Deserialize)]
pub struct BotConfig {
    /// Bot token, sent as `Authorization: Bot <token>`
    pub token: String,
    /// The bot's own user ID; fetched from `/user/me` when absent
    #[serde(default)]
    pub user_id: Option<String>,
    /// REST API base URL
    #[serde(default = "default_api_url")]
    pub api_url: String,
}

impl fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotConfig")
            .field("token", &"<redacted>")
            .field("user_id", &self.user_id)
            .field("api_url", &self.api_url)
            .finish()
    }
}

/// Gateway connection settings
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Endpoint-resolution URL (returns the WebSocket URL)
    pub url: String,
    /// Request zlib-compressed frames
    #[serde(default = "default_true")]
    pub compress: bool,
    /// Capability bitmask sent in Identify
    #[serde(default = "default_intents")]
    pub intents: u32,
    #[serde(default = "default_heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u64,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_hello_timeout_ms")]
    pub hello_timeout_ms: u64,
    /// Connection attempts before giving up
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Fixed delay between attempts
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Event handler invocations allowed to run at once
    #[serde(default = "default_handler_concurrency")]
    pub handler_concurrency: usize,
}

impl GatewayConfig {
    /// Create a gateway configuration with defaults for everything but the URL
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            compress: default_true(),
            intents: default_intents(),
            heartbeat_interval_ms: default_heartbeat_interval_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            hello_timeout_ms: default_hello_timeout_ms(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            handler_concurrency: default_handler_concurrency(),
        }
    }

    #[must_use]
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }

    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    #[must_use]
    pub fn hello_timeout(&self) -> Duration {
        Duration::from_millis(self.hello_timeout_ms)
    }

    #[must_use]
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self::new(default_gateway_url(&default_api_url()))
    }
}

/// LLM backend settings (OpenAI-compatible chat completions)
#[derive(Clone, Deserialize)]
pub struct LlmConfig {
    /// API key; the LLM step is skipped when absent
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

impl LlmConfig {
    /// Whether an API key is configured
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_llm_base_url(),
            model: default_llm_model(),
            system_prompt: default_system_prompt(),
        }
    }
}

impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

// Default value functions
fn default_app_name() -> String {
    "kook-bot".to_string()
}

fn default_env() -> Environment {
    Environment::Development
}

fn default_true() -> bool {
    true
}

fn default_api_url() -> String {
    "https://www.kookapp.cn/api/v3".to_string()
}

fn default_gateway_url(api_url: &str) -> String {
    format!("{}/gateway/index", api_url.trim_end_matches('/'))
}

fn default_intents() -> u32 {
    513
}

fn default_heartbeat_interval_ms() -> u64 {
    30_000
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_hello_timeout_ms() -> u64 {
    30_000
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    5_000
}

fn default_handler_concurrency() -> usize {
    4
}

fn default_llm_base_url() -> String {
    "https://api.deepseek.com".to_string()
}

fn default_llm_model() -> String {
    "deepseek-chat".to_string()
}

fn default_system_prompt() -> String {
    "你是一个助手，可以帮助用户查询游戏、音乐等信息。如果需要调用工具，请明确说明。".to_string()
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if a required variable is missing or a value fails to parse
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_url = var("KOOK_API_URL").unwrap_or_else(default_api_url);

        Ok(Self {
            app: AppSettings {
                name: var("APP_NAME").unwrap_or_else(default_app_name),
                env: var("APP_ENV")
                    .and_then(|s| Environment::parse(&s))
                    .unwrap_or_default(),
            },
            gateway: GatewayConfig {
                url: var("GATEWAY_URL").unwrap_or_else(|| default_gateway_url(&api_url)),
                compress: parse_bool(var("GATEWAY_COMPRESS"), "GATEWAY_COMPRESS", true)?,
                intents: parse_or(var("GATEWAY_INTENTS"), "GATEWAY_INTENTS", default_intents())?,
                heartbeat_interval_ms: parse_or(
                    var("GATEWAY_HEARTBEAT_INTERVAL_MS"),
                    "GATEWAY_HEARTBEAT_INTERVAL_MS",
                    default_heartbeat_interval_ms(),
                )?,
                connect_timeout_ms: parse_or(
                    var("GATEWAY_CONNECT_TIMEOUT_MS"),
                    "GATEWAY_CONNECT_TIMEOUT_MS",
                    default_connect_timeout_ms(),
                )?,
                hello_timeout_ms: parse_or(
                    var("GATEWAY_HELLO_TIMEOUT_MS"),
                    "GATEWAY_HELLO_TIMEOUT_MS",
                    default_hello_timeout_ms(),
                )?,
                max_retries: parse_or(
                    var("GATEWAY_MAX_RETRIES"),
                    "GATEWAY_MAX_RETRIES",
                    default_max_retries(),
                )?,
                retry_delay_ms: parse_or(
                    var("GATEWAY_RETRY_DELAY_MS"),
                    "GATEWAY_RETRY_DELAY_MS",
                    default_retry_delay_ms(),
                )?,
                handler_concurrency: parse_or(
                    var("GATEWAY_HANDLER_CONCURRENCY"),
                    "GATEWAY_HANDLER_CONCURRENCY",
                    default_handler_concurrency(),
                )?,
            },
            bot: BotConfig {
                token: var("BOT_TOKEN").ok_or(ConfigError::MissingVar("BOT_TOKEN"))?,
                user_id: var("BOT_USER_ID"),
                api_url,
            },
            llm: LlmConfig {
                api_key: var("DEEPSEEK_API_KEY"),
                base_url: var("DEEPSEEK_BASE_URL").unwrap_or_else(default_llm_base_url),
                model: var("DEEPSEEK_MODEL").unwrap_or_else(default_llm_model),
                system_prompt: var("SYSTEM_PROMPT").unwrap_or_else(default_system_prompt),
            },
        })
        .and_then(Self::validated)
    }

    fn validated(self) -> Result<Self, ConfigError> {
        if self.gateway.max_retries == 0 {
            return Err(ConfigError::InvalidValue(
                "GATEWAY_MAX_RETRIES",
                "must be at least 1".to_string(),
            ));
        }
        if self.gateway.heartbeat_interval_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "GATEWAY_HEARTBEAT_INTERVAL_MS",
                "must be greater than 0".to_string(),
            ));
        }
        if self.gateway.handler_concurrency == 0 {
            return Err(ConfigError::InvalidValue(
                "GATEWAY_HANDLER_CONCURRENCY",
                "must be at least 1".to_string(),
            ));
        }
        Ok(self)
    }
}

fn parse_or<T: FromStr>(value: Option<String>, key: &'static str, default: T) -> Result<T, ConfigError> {
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key, raw)),
        None => Ok(default),
    }
}

fn parse_bool(value: Option<String>, key: &'static str, default: bool) -> Result<bool, ConfigError> {
    match value {
        Some(raw) => match raw.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidValue(key, raw)),
        },
        None => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
