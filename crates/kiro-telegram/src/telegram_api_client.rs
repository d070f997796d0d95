//! Telegram Bot API client implementing the bridge's messaging gateway.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use kiro_bridge::{BridgeError, ChoiceOption, ConversationId, MessageId, MessagingGateway};
use serde::Deserialize;
use serde_json::{json, Value};

pub const DEFAULT_TELEGRAM_API_BASE: &str = "https://api.telegram.org";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;
const ACKNOWLEDGED_REACTION: &str = "✅";
const ERROR_BODY_LIMIT: usize = 400;

/// Commands advertised in the Telegram client menu.
pub const BOT_COMMANDS: &[(&str, &str)] = &[
    ("clear", "Clear conversation"),
    ("resume", "Resume session (shows options)"),
    ("stop", "Interrupt Kiro (Escape)"),
    ("status", "Check tmux status"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelegramClientConfig {
    pub api_base: String,
    pub bot_token: String,
    pub request_timeout_ms: u64,
}

impl TelegramClientConfig {
    pub fn new(bot_token: impl Into<String>) -> Self {
        Self {
            api_base: DEFAULT_TELEGRAM_API_BASE.to_string(),
            bot_token: bot_token.into(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TelegramApiResponse {
    ok: bool,
    description: Option<String>,
}

#[derive(Clone)]
pub struct TelegramApiClient {
    http: reqwest::Client,
    api_base: String,
    bot_token: String,
}

impl std::fmt::Debug for TelegramApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramApiClient")
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

impl TelegramApiClient {
    pub fn new(config: TelegramClientConfig) -> Result<Self> {
        let bot_token = config.bot_token.trim().to_string();
        if bot_token.is_empty() {
            bail!("telegram bot token cannot be empty");
        }
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("Kiro-telegram-bridge"),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(config.request_timeout_ms.max(1)))
            .build()
            .context("failed to create telegram api client")?;

        Ok(Self {
            http,
            api_base: config.api_base.trim().trim_end_matches('/').to_string(),
            bot_token,
        })
    }

    /// Publishes [`BOT_COMMANDS`] through `setMyCommands`.
    pub async fn register_commands(&self) -> Result<(), BridgeError> {
        let commands = BOT_COMMANDS
            .iter()
            .map(|(command, description)| json!({"command": command, "description": description}))
            .collect::<Vec<_>>();
        self.call("setMyCommands", &json!({ "commands": commands }))
            .await
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.bot_token, method)
    }

    async fn call(&self, method: &str, payload: &Value) -> Result<(), BridgeError> {
        let response = self
            .http
            .post(self.method_url(method))
            .json(payload)
            .send()
            .await
            .map_err(|error| {
                BridgeError::Transport(format!(
                    "telegram {method} request failed: {}",
                    error.without_url()
                ))
            })?;
        let status = response.status();
        let body = response.text().await.map_err(|error| {
            BridgeError::Transport(format!(
                "failed to read telegram {method} response: {}",
                error.without_url()
            ))
        })?;
        let parsed = serde_json::from_str::<TelegramApiResponse>(&body).ok();

        if !status.is_success() {
            let detail = parsed
                .and_then(|response| response.description)
                .unwrap_or_else(|| truncate_for_error(&body, ERROR_BODY_LIMIT));
            return Err(BridgeError::Transport(format!(
                "telegram {method} failed with status {}: {detail}",
                status.as_u16()
            )));
        }
        match parsed {
            Some(response) if response.ok => {
                tracing::debug!(method, "telegram api call succeeded");
                Ok(())
            }
            Some(response) => Err(BridgeError::Transport(format!(
                "telegram {method} rejected: {}",
                response
                    .description
                    .unwrap_or_else(|| "unknown error".to_string())
            ))),
            None => Err(BridgeError::Transport(format!(
                "failed to decode telegram {method} response: {}",
                truncate_for_error(&body, ERROR_BODY_LIMIT)
            ))),
        }
    }
}

#[async_trait]
impl MessagingGateway for TelegramApiClient {
    async fn send_reply(
        &self,
        conversation: &ConversationId,
        text: &str,
    ) -> Result<(), BridgeError> {
        self.call(
            "sendMessage",
            &json!({ "chat_id": numeric_or_text(conversation.as_str()), "text": text }),
        )
        .await
    }

    async fn send_choice_prompt(
        &self,
        conversation: &ConversationId,
        text: &str,
        choices: &[ChoiceOption],
    ) -> Result<(), BridgeError> {
        self.call(
            "sendMessage",
            &json!({
                "chat_id": numeric_or_text(conversation.as_str()),
                "text": text,
                "reply_markup": { "inline_keyboard": inline_keyboard(choices) },
            }),
        )
        .await
    }

    async fn send_liveness_signal(&self, conversation: &ConversationId) -> Result<(), BridgeError> {
        self.call(
            "sendChatAction",
            &json!({ "chat_id": numeric_or_text(conversation.as_str()), "action": "typing" }),
        )
        .await
    }

    async fn mark_acknowledged(
        &self,
        conversation: &ConversationId,
        message: &MessageId,
    ) -> Result<(), BridgeError> {
        self.call(
            "setMessageReaction",
            &json!({
                "chat_id": numeric_or_text(conversation.as_str()),
                "message_id": numeric_or_text(message.as_str()),
                "reaction": [{ "type": "emoji", "emoji": ACKNOWLEDGED_REACTION }],
            }),
        )
        .await
    }

    async fn acknowledge_selection(&self, selection_id: &str) -> Result<(), BridgeError> {
        self.call(
            "answerCallbackQuery",
            &json!({ "callback_query_id": selection_id }),
        )
        .await
    }
}

/// One button per row.
fn inline_keyboard(choices: &[ChoiceOption]) -> Value {
    Value::Array(
        choices
            .iter()
            .map(|choice| json!([{ "text": choice.label, "callback_data": choice.token }]))
            .collect(),
    )
}

/// Telegram ids are integers on the wire; channel usernames stay strings.
fn numeric_or_text(value: &str) -> Value {
    value
        .parse::<i64>()
        .map(Value::from)
        .unwrap_or_else(|_| Value::String(value.to_string()))
}

fn truncate_for_error(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut truncated = text.chars().take(max_chars).collect::<String>();
    truncated.push_str("...");
    truncated
}
