//! Terminal host seam used by the Kiro Telegram bridge.
//!
//! The bridge can only ask whether the agent's tmux session exists and inject
//! keystrokes into it. Nothing here observes what the foreground process does
//! with those keystrokes.

pub mod session_handle;
pub mod terminal_host;
pub mod tmux_host;

pub use session_handle::SessionHandle;
pub use terminal_host::{ControlKey, Keystrokes, TerminalHost};
pub use tmux_host::{TmuxHost, DEFAULT_TMUX_TIMEOUT_MS};
