//! In-memory terminal host and messaging gateway doubles for unit tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use kiro_terminal::{Keystrokes, TerminalHost};

use crate::bridge_contract::{ChoiceOption, ConversationId, MessageId};
use crate::bridge_error::BridgeError;
use crate::messaging_gateway::MessagingGateway;

pub(crate) struct RecordingTerminalHost {
    exists: AtomicBool,
    injected: Mutex<Vec<Keystrokes>>,
}

impl RecordingTerminalHost {
    pub(crate) fn present() -> Self {
        Self {
            exists: AtomicBool::new(true),
            injected: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn absent() -> Self {
        let host = Self::present();
        host.set_exists(false);
        host
    }

    pub(crate) fn set_exists(&self, exists: bool) {
        self.exists.store(exists, Ordering::SeqCst);
    }

    pub(crate) fn injections(&self) -> Vec<Keystrokes> {
        self.injected.lock().expect("injected lock").clone()
    }
}

#[async_trait]
impl TerminalHost for RecordingTerminalHost {
    async fn session_exists(&self, _session: &str) -> Result<bool> {
        Ok(self.exists.load(Ordering::SeqCst))
    }

    async fn inject(&self, _session: &str, keystrokes: &Keystrokes) -> Result<()> {
        self.injected
            .lock()
            .expect("injected lock")
            .push(keystrokes.clone());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum GatewayCall {
    Reply {
        conversation: ConversationId,
        text: String,
    },
    ChoicePrompt {
        conversation: ConversationId,
        text: String,
        choices: Vec<ChoiceOption>,
    },
    Liveness {
        conversation: ConversationId,
    },
    Acknowledged {
        conversation: ConversationId,
        message: MessageId,
    },
    SelectionAcknowledged {
        selection_id: String,
    },
}

#[derive(Default)]
pub(crate) struct RecordingGateway {
    calls: Mutex<Vec<GatewayCall>>,
    failing: AtomicBool,
    stall_acknowledgements: AtomicBool,
}

impl RecordingGateway {
    pub(crate) fn failing() -> Self {
        let gateway = Self::default();
        gateway.failing.store(true, Ordering::SeqCst);
        gateway
    }

    /// Acknowledgement calls hang for a minute before being recorded.
    pub(crate) fn stalling_acknowledgements() -> Self {
        let gateway = Self::default();
        gateway.stall_acknowledgements.store(true, Ordering::SeqCst);
        gateway
    }

    pub(crate) fn calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().expect("calls lock").clone()
    }

    /// Calls other than liveness signals, whose count depends on timing.
    pub(crate) fn visible_calls(&self) -> Vec<GatewayCall> {
        self.calls()
            .into_iter()
            .filter(|call| !matches!(call, GatewayCall::Liveness { .. }))
            .collect()
    }

    pub(crate) fn replies(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                GatewayCall::Reply { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn liveness_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, GatewayCall::Liveness { .. }))
            .count()
    }

    async fn stall_if_configured(&self) {
        if self.stall_acknowledgements.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_secs(60)).await;
        }
    }

    fn record(&self, call: GatewayCall) -> Result<(), BridgeError> {
        self.calls.lock().expect("calls lock").push(call);
        if self.failing.load(Ordering::SeqCst) {
            return Err(BridgeError::Transport("gateway offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl MessagingGateway for RecordingGateway {
    async fn send_reply(
        &self,
        conversation: &ConversationId,
        text: &str,
    ) -> Result<(), BridgeError> {
        self.record(GatewayCall::Reply {
            conversation: conversation.clone(),
            text: text.to_string(),
        })
    }

    async fn send_choice_prompt(
        &self,
        conversation: &ConversationId,
        text: &str,
        choices: &[ChoiceOption],
    ) -> Result<(), BridgeError> {
        self.record(GatewayCall::ChoicePrompt {
            conversation: conversation.clone(),
            text: text.to_string(),
            choices: choices.to_vec(),
        })
    }

    async fn send_liveness_signal(&self, conversation: &ConversationId) -> Result<(), BridgeError> {
        self.record(GatewayCall::Liveness {
            conversation: conversation.clone(),
        })
    }

    async fn mark_acknowledged(
        &self,
        conversation: &ConversationId,
        message: &MessageId,
    ) -> Result<(), BridgeError> {
        self.stall_if_configured().await;
        self.record(GatewayCall::Acknowledged {
            conversation: conversation.clone(),
            message: message.clone(),
        })
    }

    async fn acknowledge_selection(&self, selection_id: &str) -> Result<(), BridgeError> {
        self.stall_if_configured().await;
        self.record(GatewayCall::SelectionAcknowledged {
            selection_id: selection_id.to_string(),
        })
    }
}
