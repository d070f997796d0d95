use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use kiro_bridge::{BridgeConfig, BridgeError, LaunchConfig, ScriptDelays};
use kiro_telegram::{TelegramClientConfig, DEFAULT_REQUEST_TIMEOUT_MS, DEFAULT_TELEGRAM_API_BASE};
use kiro_terminal::DEFAULT_TMUX_TIMEOUT_MS;

const DEFAULT_STATE_DIR_NAME: &str = ".kiro";

fn parse_positive_u64(value: &str) -> Result<u64, String> {
    let parsed = value
        .parse::<u64>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

#[derive(Debug, Clone, Parser)]
#[command(
    name = "kiro-telegram-bridge",
    about = "Bridges a Telegram bot to a Kiro CLI agent running in tmux",
    version
)]
pub struct BridgeServerArgs {
    #[arg(
        long,
        env = "TMUX_SESSION",
        default_value = "kiro",
        help = "tmux session that runs the Kiro CLI agent"
    )]
    pub tmux_session: String,

    #[arg(
        long,
        env = "PORT",
        default_value_t = 8080,
        help = "Port for the Telegram webhook listener"
    )]
    pub port: u16,

    #[arg(
        long,
        env = "BRIDGE_BIND_HOST",
        default_value = "0.0.0.0",
        help = "Address the webhook listener binds to"
    )]
    pub bind_host: String,

    #[arg(
        long,
        env = "KIRO_AGENT",
        default_value = "telegram-bridge",
        help = "Named Kiro agent passed as --agent on resume; empty disables it"
    )]
    pub kiro_agent: String,

    #[arg(
        long,
        env = "KIRO_AGENT_COMMAND",
        default_value = "kiro-cli chat",
        help = "Command typed into the session to relaunch the agent"
    )]
    pub agent_command: String,

    #[arg(
        long,
        env = "TELEGRAM_BOT_TOKEN",
        hide_env_values = true,
        help = "Telegram bot token"
    )]
    pub telegram_bot_token: Option<String>,

    #[arg(
        long,
        env = "TELEGRAM_API_BASE",
        default_value = DEFAULT_TELEGRAM_API_BASE,
        help = "Base URL for the Telegram Bot API"
    )]
    pub telegram_api_base: String,

    #[arg(
        long,
        env = "KIRO_BRIDGE_STATE_DIR",
        help = "Directory for bridge state files (defaults to $HOME/.kiro)"
    )]
    pub state_dir: Option<PathBuf>,

    #[arg(
        long,
        env = "KIRO_BRIDGE_TYPING_INTERVAL_MS",
        default_value_t = 4_000,
        value_parser = parse_positive_u64,
        help = "Interval between typing indicators while a turn is pending"
    )]
    pub typing_interval_ms: u64,

    #[arg(
        long,
        env = "KIRO_BRIDGE_REQUEST_TIMEOUT_MS",
        default_value_t = DEFAULT_REQUEST_TIMEOUT_MS,
        value_parser = parse_positive_u64,
        help = "Timeout for Telegram Bot API requests"
    )]
    pub request_timeout_ms: u64,

    #[arg(
        long,
        env = "KIRO_BRIDGE_TMUX_TIMEOUT_MS",
        default_value_t = DEFAULT_TMUX_TIMEOUT_MS,
        value_parser = parse_positive_u64,
        help = "Timeout for each tmux invocation"
    )]
    pub tmux_timeout_ms: u64,

    #[arg(
        long,
        default_value_t = false,
        help = "Skip publishing the bot command menu at startup"
    )]
    pub skip_command_registration: bool,
}

impl BridgeServerArgs {
    pub fn bind_addr(&self) -> Result<SocketAddr, BridgeError> {
        let host = self.bind_host.trim();
        let ip = host.parse::<IpAddr>().map_err(|error| {
            BridgeError::Configuration(format!("invalid --bind-host '{host}': {error}"))
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn telegram_config(&self) -> Result<TelegramClientConfig, BridgeError> {
        let bot_token = self
            .telegram_bot_token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                BridgeError::Configuration("TELEGRAM_BOT_TOKEN is required".to_string())
            })?;
        Ok(TelegramClientConfig {
            api_base: self.telegram_api_base.clone(),
            bot_token: bot_token.to_string(),
            request_timeout_ms: self.request_timeout_ms,
        })
    }

    pub fn bridge_config(&self) -> Result<BridgeConfig, BridgeError> {
        let session_name = self.tmux_session.trim();
        if session_name.is_empty() {
            return Err(BridgeError::Configuration(
                "--tmux-session cannot be empty".to_string(),
            ));
        }
        let agent_command = self.agent_command.trim();
        if agent_command.is_empty() {
            return Err(BridgeError::Configuration(
                "--agent-command cannot be empty".to_string(),
            ));
        }
        let named_agent = Some(self.kiro_agent.trim().to_string()).filter(|agent| !agent.is_empty());

        Ok(BridgeConfig {
            session_name: session_name.to_string(),
            state_dir: self.resolve_state_dir()?,
            typing_interval: Duration::from_millis(self.typing_interval_ms),
            delays: ScriptDelays::default(),
            launch: LaunchConfig {
                agent_command: agent_command.to_string(),
                named_agent,
            },
        })
    }

    fn resolve_state_dir(&self) -> Result<PathBuf, BridgeError> {
        if let Some(state_dir) = &self.state_dir {
            if state_dir.as_os_str().is_empty() {
                return Err(BridgeError::Configuration(
                    "--state-dir cannot be empty".to_string(),
                ));
            }
            return Ok(state_dir.clone());
        }
        std::env::var_os("HOME")
            .filter(|home| !home.is_empty())
            .map(|home| PathBuf::from(home).join(DEFAULT_STATE_DIR_NAME))
            .ok_or_else(|| {
                BridgeError::Configuration(
                    "HOME is not set; pass --state-dir or KIRO_BRIDGE_STATE_DIR".to_string(),
                )
            })
    }
}
