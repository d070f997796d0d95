use anyhow::Result;
use async_trait::async_trait;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Named control keys the bridge may inject. Never sent as literal text.
pub enum ControlKey {
    Enter,
    Escape,
    Interrupt,
    ClearLine,
}

impl ControlKey {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Enter => "enter",
            Self::Escape => "escape",
            Self::Interrupt => "interrupt",
            Self::ClearLine => "clear_line",
        }
    }

    /// Key name understood by `tmux send-keys` without `-l`.
    pub fn tmux_key_name(self) -> &'static str {
        match self {
            Self::Enter => "Enter",
            Self::Escape => "Escape",
            Self::Interrupt => "C-c",
            Self::ClearLine => "C-u",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// One injection payload: literal keystrokes or a single control key.
pub enum Keystrokes {
    Literal(String),
    Control(ControlKey),
}

impl Keystrokes {
    pub fn literal(text: impl Into<String>) -> Self {
        Self::Literal(text.into())
    }

    pub fn is_control(&self) -> bool {
        matches!(self, Self::Control(_))
    }
}

#[async_trait]
/// External terminal multiplexer hosting the agent process.
pub trait TerminalHost: Send + Sync {
    async fn session_exists(&self, session: &str) -> Result<bool>;

    async fn inject(&self, session: &str, keystrokes: &Keystrokes) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::{ControlKey, Keystrokes};

    #[test]
    fn unit_control_keys_map_to_tmux_key_names() {
        assert_eq!(ControlKey::Enter.tmux_key_name(), "Enter");
        assert_eq!(ControlKey::Escape.tmux_key_name(), "Escape");
        assert_eq!(ControlKey::Interrupt.tmux_key_name(), "C-c");
        assert_eq!(ControlKey::ClearLine.tmux_key_name(), "C-u");
    }

    #[test]
    fn unit_keystrokes_distinguish_literal_and_control_payloads() {
        assert!(!Keystrokes::literal("/clear").is_control());
        assert!(Keystrokes::Control(ControlKey::Enter).is_control());
    }
}
