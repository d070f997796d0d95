//! Two-step session resume: offer choices, then restart the agent on selection.
//!
//! Nothing is stored between the offer and the selection; the selection token
//! returned by the messaging gateway carries all the context.

use std::sync::Arc;

use kiro_terminal::SessionHandle;

use crate::bridge_contract::{ChoiceOption, ConversationId, SelectionEvent};
use crate::bridge_error::{BridgeError, TMUX_SESSION_NOT_FOUND_REPLY};
use crate::key_script::{restart_script, run_script, ScriptDelays};
use crate::messaging_gateway::{spawn_best_effort, swallow_transport_failure, MessagingGateway};

pub const RESUME_PROMPT_TEXT: &str = "Select resume option:";
pub const DEFAULT_AGENT_COMMAND: &str = "kiro-cli chat";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeSelection {
    Recent,
    Picker,
}

impl ResumeSelection {
    pub const ALL: [Self; 2] = [Self::Recent, Self::Picker];

    pub fn token(self) -> &'static str {
        match self {
            Self::Recent => "recent",
            Self::Picker => "picker",
        }
    }

    /// Accepts the current tokens plus the `resume_*` tokens rendered by
    /// keyboards from older bridge builds. Anything else is not ours.
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim() {
            "recent" | "resume_recent" => Some(Self::Recent),
            "picker" | "resume_picker" => Some(Self::Picker),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Recent => "📋 Resume most recent",
            Self::Picker => "🔍 Pick from sessions",
        }
    }

    fn launch_flag(self) -> &'static str {
        match self {
            Self::Recent => "--resume",
            Self::Picker => "--resume-picker",
        }
    }

    fn confirmation(self) -> &'static str {
        match self {
            Self::Recent => "Resuming most recent session...",
            Self::Picker => "Opening session picker...",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchConfig {
    pub agent_command: String,
    /// Appended as `--agent <name>` when set.
    pub named_agent: Option<String>,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            agent_command: DEFAULT_AGENT_COMMAND.to_string(),
            named_agent: None,
        }
    }
}

impl LaunchConfig {
    pub fn launch_command(&self, selection: ResumeSelection) -> String {
        let mut command = format!(
            "{} {} --trust-all-tools",
            self.agent_command.trim(),
            selection.launch_flag()
        );
        if let Some(agent) = self
            .named_agent
            .as_deref()
            .map(str::trim)
            .filter(|agent| !agent.is_empty())
        {
            command.push_str(" --agent ");
            command.push_str(agent);
        }
        command
    }
}

#[derive(Clone)]
pub struct ResumeFlow {
    session: SessionHandle,
    gateway: Arc<dyn MessagingGateway>,
    launch: LaunchConfig,
    delays: ScriptDelays,
}

impl ResumeFlow {
    pub fn new(
        session: SessionHandle,
        gateway: Arc<dyn MessagingGateway>,
        launch: LaunchConfig,
        delays: ScriptDelays,
    ) -> Self {
        Self {
            session,
            gateway,
            launch,
            delays,
        }
    }

    pub fn choices() -> Vec<ChoiceOption> {
        ResumeSelection::ALL
            .iter()
            .map(|selection| ChoiceOption::new(selection.label(), selection.token()))
            .collect()
    }

    /// Idle to Offered. The caller has already verified the session exists.
    pub async fn offer(&self, conversation: &ConversationId) {
        swallow_transport_failure(
            "send_choice_prompt",
            self.gateway
                .send_choice_prompt(conversation, RESUME_PROMPT_TEXT, &Self::choices())
                .await,
        );
    }

    /// Offered to Recent/Picker and back to Idle. Unknown tokens are ignored.
    pub async fn handle_selection(&self, event: &SelectionEvent) -> Result<(), BridgeError> {
        let Some(selection) = ResumeSelection::from_token(&event.token) else {
            tracing::debug!(
                conversation = %event.conversation_id,
                token = %event.token,
                "ignoring unknown selection token"
            );
            return Ok(());
        };

        let gateway = self.gateway.clone();
        let selection_id = event.selection_id.clone();
        spawn_best_effort("acknowledge_selection", async move {
            gateway.acknowledge_selection(&selection_id).await
        });

        if !self.session.exists().await {
            return Err(BridgeError::session_missing(TMUX_SESSION_NOT_FOUND_REPLY));
        }

        let launch_command = self.launch.launch_command(selection);
        tracing::info!(
            conversation = %event.conversation_id,
            selection = selection.token(),
            launch_command = %launch_command,
            "restarting agent session"
        );
        run_script(
            &self.session,
            &restart_script(&self.delays, &launch_command),
        )
        .await;

        swallow_transport_failure(
            "send_reply",
            self.gateway
                .send_reply(&event.conversation_id, selection.confirmation())
                .await,
        );
        Ok(())
    }
}
