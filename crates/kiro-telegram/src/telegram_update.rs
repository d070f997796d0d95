//! Normalizes Telegram webhook updates into bridge events.

use kiro_bridge::{
    BridgeError, ConversationId, InboundEvent, MessageEvent, MessageId, SelectionEvent,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct TelegramUpdate {
    #[serde(default)]
    message: Option<TelegramMessage>,
    #[serde(default)]
    callback_query: Option<TelegramCallbackQuery>,
}

#[derive(Debug, Deserialize)]
struct TelegramMessage {
    #[serde(default)]
    message_id: Option<i64>,
    #[serde(default)]
    chat: Option<TelegramChat>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TelegramChat {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct TelegramCallbackQuery {
    id: String,
    #[serde(default)]
    data: Option<String>,
    #[serde(default)]
    message: Option<TelegramMessage>,
}

/// A callback query wins over a message when an update carries both.
pub fn parse_update(body: &[u8]) -> Result<InboundEvent, BridgeError> {
    let update = serde_json::from_slice::<TelegramUpdate>(body)
        .map_err(|error| BridgeError::MalformedEvent(format!("invalid update json: {error}")))?;

    if let Some(callback) = update.callback_query {
        return selection_event(callback);
    }
    if let Some(message) = update.message {
        return message_event(message);
    }
    Err(BridgeError::MalformedEvent(
        "update carries neither message nor callback_query".to_string(),
    ))
}

fn selection_event(callback: TelegramCallbackQuery) -> Result<InboundEvent, BridgeError> {
    let chat_id = callback
        .message
        .and_then(|message| message.chat)
        .map(|chat| chat.id)
        .ok_or_else(|| BridgeError::MalformedEvent("callback_query without chat".to_string()))?;
    let token = callback
        .data
        .filter(|data| !data.trim().is_empty())
        .ok_or_else(|| BridgeError::MalformedEvent("callback_query without data".to_string()))?;
    Ok(InboundEvent::Selection(SelectionEvent {
        conversation_id: ConversationId::from(chat_id),
        selection_id: callback.id,
        token,
    }))
}

fn message_event(message: TelegramMessage) -> Result<InboundEvent, BridgeError> {
    let chat_id = message
        .chat
        .map(|chat| chat.id)
        .ok_or_else(|| BridgeError::MalformedEvent("message without chat".to_string()))?;
    let text = message
        .text
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| BridgeError::MalformedEvent("message without text".to_string()))?;
    Ok(InboundEvent::Message(MessageEvent {
        conversation_id: ConversationId::from(chat_id),
        text,
        message_id: message.message_id.map(MessageId::from),
    }))
}
