//! Slash-command classification and dispatch.
//!
//! A trimmed message starting with `/` names a command by its first
//! whitespace-delimited token, matched case-insensitively. Slash tokens the
//! bridge does not own are forwarded to the agent as ordinary input, since
//! the agent defines slash commands of its own.

use std::sync::Arc;

use kiro_terminal::{ControlKey, SessionHandle};

use crate::bridge_contract::MessageEvent;
use crate::bridge_error::{BridgeError, TMUX_NOT_FOUND_REPLY};
use crate::key_script::{clear_script, run_script, ScriptDelays};
use crate::messaging_gateway::{spawn_best_effort, swallow_transport_failure, MessagingGateway};
use crate::progress_reporter::ProgressReporter;
use crate::resume_flow::ResumeFlow;
use crate::turn_state::TurnTracker;

/// Agent commands that need an interactive terminal and cannot work over chat.
pub const BLOCKED_COMMANDS: &[&str] = &[
    "mcp",
    "help",
    "settings",
    "config",
    "model",
    "compact",
    "cost",
    "doctor",
    "init",
    "login",
    "logout",
    "memory",
    "permissions",
    "pr",
    "review",
    "terminal",
    "vim",
    "approved-tools",
    "listen",
];

const DEPRECATED_COMMANDS: &[(&str, &str)] = &[
    ("continue_", "Use /resume instead"),
    ("loop", "Ralph Loop not supported in Kiro CLI"),
];

const LOG_PREVIEW_CHARS: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeCommand {
    Status,
    Stop,
    Clear,
    Resume,
    Deprecated {
        name: &'static str,
        reply: &'static str,
    },
    Blocked {
        name: String,
    },
}

impl BridgeCommand {
    pub fn name(&self) -> &str {
        match self {
            Self::Status => "status",
            Self::Stop => "stop",
            Self::Clear => "clear",
            Self::Resume => "resume",
            Self::Deprecated { name, .. } => name,
            Self::Blocked { name } => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageRoute {
    Command(BridgeCommand),
    FreeForm,
}

/// Lowercased command token without its leading slash, if `text` is slash-prefixed.
pub fn command_name(text: &str) -> Option<String> {
    let token = text.trim().split_whitespace().next()?;
    let name = token.strip_prefix('/')?;
    Some(name.to_lowercase())
}

pub fn route_message(text: &str) -> MessageRoute {
    let Some(name) = command_name(text) else {
        return MessageRoute::FreeForm;
    };
    let command = match name.as_str() {
        "status" => BridgeCommand::Status,
        "stop" => BridgeCommand::Stop,
        "clear" => BridgeCommand::Clear,
        "resume" => BridgeCommand::Resume,
        other => {
            if let Some((name, reply)) = DEPRECATED_COMMANDS
                .iter()
                .find(|(deprecated, _)| *deprecated == other)
            {
                BridgeCommand::Deprecated { name, reply }
            } else if BLOCKED_COMMANDS.contains(&other) {
                BridgeCommand::Blocked {
                    name: other.to_string(),
                }
            } else {
                return MessageRoute::FreeForm;
            }
        }
    };
    MessageRoute::Command(command)
}

#[derive(Clone)]
pub struct CommandRouter {
    session: SessionHandle,
    gateway: Arc<dyn MessagingGateway>,
    turns: Arc<TurnTracker>,
    reporter: ProgressReporter,
    resume: ResumeFlow,
    delays: ScriptDelays,
}

impl CommandRouter {
    pub fn new(
        session: SessionHandle,
        gateway: Arc<dyn MessagingGateway>,
        turns: Arc<TurnTracker>,
        reporter: ProgressReporter,
        resume: ResumeFlow,
        delays: ScriptDelays,
    ) -> Self {
        Self {
            session,
            gateway,
            turns,
            reporter,
            resume,
            delays,
        }
    }

    pub async fn dispatch(&self, event: &MessageEvent) -> Result<(), BridgeError> {
        self.turns.record_conversation(&event.conversation_id);
        match route_message(&event.text) {
            MessageRoute::Command(command) => {
                tracing::info!(
                    conversation = %event.conversation_id,
                    command = command.name(),
                    "handling bridge command"
                );
                self.run_command(event, command).await
            }
            MessageRoute::FreeForm => self.forward_to_agent(event).await,
        }
    }

    async fn run_command(
        &self,
        event: &MessageEvent,
        command: BridgeCommand,
    ) -> Result<(), BridgeError> {
        let conversation = &event.conversation_id;
        match command {
            BridgeCommand::Status => {
                let state = if self.session.exists().await {
                    "running"
                } else {
                    "not found"
                };
                let reply = format!("tmux '{}': {}", self.session.session_name(), state);
                self.reply(event, &reply).await;
            }
            BridgeCommand::Stop => {
                if self.session.exists().await {
                    self.session.send_key(ControlKey::Escape).await;
                }
                self.turns.end_turn();
                self.reply(event, "Interrupted").await;
            }
            BridgeCommand::Clear => {
                if !self.session.exists().await {
                    return Err(BridgeError::session_missing(TMUX_NOT_FOUND_REPLY));
                }
                run_script(&self.session, &clear_script(&self.delays)).await;
                self.reply(event, "Cleared").await;
            }
            BridgeCommand::Resume => {
                if !self.session.exists().await {
                    return Err(BridgeError::session_missing(TMUX_NOT_FOUND_REPLY));
                }
                self.resume.offer(conversation).await;
            }
            BridgeCommand::Deprecated { reply, .. } => self.reply(event, reply).await,
            BridgeCommand::Blocked { name } => {
                self.reply(event, &format!("'/{name}' not supported (interactive)"))
                    .await;
            }
        }
        Ok(())
    }

    /// The turn is marked pending and the acknowledgement issued before the
    /// session check, so the user sees feedback even when the session is gone.
    async fn forward_to_agent(&self, event: &MessageEvent) -> Result<(), BridgeError> {
        let origin = event.conversation_id.clone();
        tracing::info!(
            conversation = %origin,
            preview = %preview(&event.text),
            "forwarding message to agent session"
        );
        self.turns.begin_turn(origin.clone());

        if let Some(message_id) = event.message_id.clone() {
            let gateway = self.gateway.clone();
            let conversation = origin.clone();
            spawn_best_effort("mark_acknowledged", async move {
                gateway.mark_acknowledged(&conversation, &message_id).await
            });
        }

        if !self.session.exists().await {
            self.turns.end_turn();
            return Err(BridgeError::session_missing(TMUX_NOT_FOUND_REPLY));
        }

        self.reporter.start(origin);
        self.session.send_text(&event.text).await;
        self.session.send_key(ControlKey::Enter).await;
        Ok(())
    }

    async fn reply(&self, event: &MessageEvent, text: &str) {
        swallow_transport_failure(
            "send_reply",
            self.gateway.send_reply(&event.conversation_id, text).await,
        );
    }
}

fn preview(text: &str) -> String {
    let mut preview = text.chars().take(LOG_PREVIEW_CHARS).collect::<String>();
    if text.chars().count() > LOG_PREVIEW_CHARS {
        preview.push_str("...");
    }
    preview
}
