use thiserror::Error;

/// Reply sent when a message or command finds the tmux session gone.
pub const TMUX_NOT_FOUND_REPLY: &str = "tmux not found";
/// Reply sent when a resume selection finds the tmux session gone.
pub const TMUX_SESSION_NOT_FOUND_REPLY: &str = "tmux session not found";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Error taxonomy of the bridge core. Only `Configuration` is ever fatal.
pub enum BridgeError {
    #[error("messaging transport error: {0}")]
    Transport(String),
    #[error("{reply}")]
    SessionMissing { reply: String },
    #[error("malformed inbound event: {0}")]
    MalformedEvent(String),
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl BridgeError {
    pub fn session_missing(reply: &str) -> Self {
        Self::SessionMissing {
            reply: reply.to_string(),
        }
    }

    pub fn reason_code(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport_error",
            Self::SessionMissing { .. } => "session_missing",
            Self::MalformedEvent(_) => "malformed_event",
            Self::Configuration(_) => "configuration_error",
        }
    }
}
