//! Event-ingestion entrypoint that wires the bridge components together.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use kiro_terminal::{SessionHandle, TerminalHost};

use crate::bridge_contract::{ConversationId, InboundEvent};
use crate::bridge_error::BridgeError;
use crate::command_router::CommandRouter;
use crate::key_script::ScriptDelays;
use crate::messaging_gateway::{swallow_transport_failure, MessagingGateway};
use crate::progress_reporter::ProgressReporter;
use crate::resume_flow::{LaunchConfig, ResumeFlow};
use crate::turn_state::{TurnStateStore, TurnStatus, TurnTracker};

pub const DEFAULT_TYPING_INTERVAL_MS: u64 = 4_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    pub session_name: String,
    pub state_dir: PathBuf,
    pub typing_interval: Duration,
    pub delays: ScriptDelays,
    pub launch: LaunchConfig,
}

impl BridgeConfig {
    pub fn new(session_name: impl Into<String>, state_dir: impl Into<PathBuf>) -> Self {
        Self {
            session_name: session_name.into(),
            state_dir: state_dir.into(),
            typing_interval: Duration::from_millis(DEFAULT_TYPING_INTERVAL_MS),
            delays: ScriptDelays::default(),
            launch: LaunchConfig::default(),
        }
    }
}

#[derive(Clone)]
pub struct BridgeController {
    gateway: Arc<dyn MessagingGateway>,
    turns: Arc<TurnTracker>,
    router: CommandRouter,
    resume: ResumeFlow,
    reporter: ProgressReporter,
}

impl BridgeController {
    pub fn new(
        config: BridgeConfig,
        host: Arc<dyn TerminalHost>,
        gateway: Arc<dyn MessagingGateway>,
    ) -> Result<Self> {
        let store = TurnStateStore::open(&config.state_dir)?;
        let turns = Arc::new(TurnTracker::restore(store)?);
        let session = SessionHandle::new(host, config.session_name);
        let reporter =
            ProgressReporter::new(gateway.clone(), turns.clone(), config.typing_interval);
        let resume = ResumeFlow::new(
            session.clone(),
            gateway.clone(),
            config.launch,
            config.delays,
        );
        let router = CommandRouter::new(
            session,
            gateway.clone(),
            turns.clone(),
            reporter.clone(),
            resume.clone(),
            config.delays,
        );
        Ok(Self {
            gateway,
            turns,
            router,
            resume,
            reporter,
        })
    }

    pub fn turn_status(&self) -> TurnStatus {
        self.turns.status()
    }

    pub fn last_conversation(&self) -> Option<ConversationId> {
        self.turns.last_conversation()
    }

    pub fn active_reporters(&self) -> usize {
        self.reporter.active_count()
    }

    /// Handles one inbound event to completion. Failures stay inside the
    /// event: a missing session is reported to the sender, anything else is
    /// logged.
    pub async fn handle_event(&self, event: InboundEvent) {
        let conversation = event.conversation_id().clone();
        if let Err(reason) = validate_event(&event) {
            tracing::debug!(
                kind = event.kind(),
                reason_code = reason.reason_code(),
                diagnostic = %reason,
                "dropping inbound event"
            );
            return;
        }

        let outcome = match &event {
            InboundEvent::Message(message) => self.router.dispatch(message).await,
            InboundEvent::Selection(selection) => self.resume.handle_selection(selection).await,
        };

        match outcome {
            Ok(()) => {}
            Err(BridgeError::SessionMissing { reply }) => {
                tracing::warn!(
                    conversation = %conversation,
                    kind = event.kind(),
                    "agent session missing"
                );
                self.turns.end_turn();
                swallow_transport_failure(
                    "send_reply",
                    self.gateway.send_reply(&conversation, &reply).await,
                );
            }
            Err(error) => {
                tracing::warn!(
                    conversation = %conversation,
                    kind = event.kind(),
                    reason_code = error.reason_code(),
                    error = %error,
                    "inbound event failed"
                );
            }
        }
    }

    /// Aborts every running progress reporter. Turn state is left on disk.
    pub fn shutdown(&self) {
        self.reporter.stop_all();
    }
}

fn validate_event(event: &InboundEvent) -> Result<(), BridgeError> {
    if event.conversation_id().is_empty() {
        return Err(BridgeError::MalformedEvent(
            "missing conversation id".to_string(),
        ));
    }
    match event {
        InboundEvent::Message(message) if message.text.trim().is_empty() => Err(
            BridgeError::MalformedEvent("empty message text".to_string()),
        ),
        InboundEvent::Selection(selection) if selection.token.trim().is_empty() => Err(
            BridgeError::MalformedEvent("empty selection token".to_string()),
        ),
        _ => Ok(()),
    }
}
