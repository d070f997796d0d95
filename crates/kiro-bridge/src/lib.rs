//! Session bridge core for the Kiro Telegram bridge.
//!
//! Tracks whether an agent turn is in flight, turns chat commands into ordered
//! keystroke scripts against the tmux session, and keeps chat-side feedback
//! (typing indicators, reactions) in step with what the bridge can observe.

pub mod bridge_contract;
pub mod bridge_controller;
pub mod bridge_error;
pub mod command_router;
pub mod key_script;
pub mod messaging_gateway;
pub mod progress_reporter;
pub mod resume_flow;
pub mod turn_state;

#[cfg(test)]
mod test_support;

pub use bridge_contract::{
    ChoiceOption, ConversationId, InboundEvent, MessageEvent, MessageId, SelectionEvent,
};
pub use bridge_controller::{BridgeConfig, BridgeController, DEFAULT_TYPING_INTERVAL_MS};
pub use bridge_error::{BridgeError, TMUX_NOT_FOUND_REPLY, TMUX_SESSION_NOT_FOUND_REPLY};
pub use command_router::{route_message, BridgeCommand, CommandRouter, MessageRoute};
pub use key_script::{clear_script, restart_script, run_script, ScriptDelays, ScriptStep};
pub use messaging_gateway::MessagingGateway;
pub use progress_reporter::ProgressReporter;
pub use resume_flow::{LaunchConfig, ResumeFlow, ResumeSelection};
pub use turn_state::{TurnState, TurnStateStore, TurnStatus, TurnTracker};
