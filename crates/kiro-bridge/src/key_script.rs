//! Ordered keystroke scripts with load-bearing settle delays.
//!
//! The terminal host never acknowledges that keystrokes were consumed, so each
//! wait below is the only synchronization with the agent process. Scripts are
//! plain data; [`run_script`] executes them in order.

use std::time::Duration;

use kiro_terminal::{ControlKey, SessionHandle};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptStep {
    Text(String),
    Key(ControlKey),
    Wait(Duration),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptDelays {
    /// After each Escape of `/clear`.
    pub clear_escape_settle: Duration,
    /// After the interrupt and line-clear keys of `/clear`.
    pub clear_line_settle: Duration,
    /// Time for the `/clear` confirmation prompt to render.
    pub clear_confirm_render: Duration,
    /// After the Escape that opens the restart script.
    pub restart_escape_settle: Duration,
    /// Time for the agent to exit after `/quit` before relaunching in the same pane.
    pub restart_quit_settle: Duration,
}

impl Default for ScriptDelays {
    fn default() -> Self {
        Self {
            clear_escape_settle: Duration::from_millis(1_000),
            clear_line_settle: Duration::from_millis(500),
            clear_confirm_render: Duration::from_millis(1_000),
            restart_escape_settle: Duration::from_millis(200),
            restart_quit_settle: Duration::from_millis(500),
        }
    }
}

impl ScriptDelays {
    pub fn zero() -> Self {
        Self {
            clear_escape_settle: Duration::ZERO,
            clear_line_settle: Duration::ZERO,
            clear_confirm_render: Duration::ZERO,
            restart_escape_settle: Duration::ZERO,
            restart_quit_settle: Duration::ZERO,
        }
    }
}

/// Two escapes because the bridge cannot tell whether a sub-prompt is open.
pub fn clear_script(delays: &ScriptDelays) -> Vec<ScriptStep> {
    vec![
        ScriptStep::Key(ControlKey::Escape),
        ScriptStep::Wait(delays.clear_escape_settle),
        ScriptStep::Key(ControlKey::Escape),
        ScriptStep::Wait(delays.clear_escape_settle),
        ScriptStep::Key(ControlKey::Interrupt),
        ScriptStep::Wait(delays.clear_line_settle),
        ScriptStep::Key(ControlKey::ClearLine),
        ScriptStep::Wait(delays.clear_line_settle),
        ScriptStep::Text("/clear".to_string()),
        ScriptStep::Key(ControlKey::Enter),
        ScriptStep::Wait(delays.clear_confirm_render),
        ScriptStep::Text("y".to_string()),
        ScriptStep::Key(ControlKey::Enter),
    ]
}

/// Quits the running agent and relaunches it in the same pane.
pub fn restart_script(delays: &ScriptDelays, launch_command: &str) -> Vec<ScriptStep> {
    vec![
        ScriptStep::Key(ControlKey::Escape),
        ScriptStep::Wait(delays.restart_escape_settle),
        ScriptStep::Text("/quit".to_string()),
        ScriptStep::Key(ControlKey::Enter),
        ScriptStep::Wait(delays.restart_quit_settle),
        ScriptStep::Text(launch_command.to_string()),
        ScriptStep::Key(ControlKey::Enter),
    ]
}

pub async fn run_script(session: &SessionHandle, steps: &[ScriptStep]) {
    for step in steps {
        match step {
            ScriptStep::Text(text) => session.send_text(text).await,
            ScriptStep::Key(key) => session.send_key(*key).await,
            ScriptStep::Wait(delay) if delay.is_zero() => {}
            ScriptStep::Wait(delay) => tokio::time::sleep(*delay).await,
        }
    }
}
