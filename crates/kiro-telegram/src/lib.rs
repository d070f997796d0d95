//! Telegram transport for the Kiro bridge: Bot API client and webhook update parsing.

pub mod telegram_api_client;
pub mod telegram_update;

pub use telegram_api_client::{
    TelegramApiClient, TelegramClientConfig, BOT_COMMANDS, DEFAULT_REQUEST_TIMEOUT_MS,
    DEFAULT_TELEGRAM_API_BASE,
};
pub use telegram_update::parse_update;
