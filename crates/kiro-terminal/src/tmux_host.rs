//! `tmux` CLI implementation of [`TerminalHost`].

use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use tokio::process::Command;

use crate::terminal_host::{Keystrokes, TerminalHost};

pub const DEFAULT_TMUX_TIMEOUT_MS: u64 = 5_000;
const TMUX_PROGRAM: &str = "tmux";

#[derive(Debug, Clone)]
pub struct TmuxHost {
    program: String,
    timeout: Duration,
}

impl Default for TmuxHost {
    fn default() -> Self {
        Self::new(DEFAULT_TMUX_TIMEOUT_MS)
    }
}

impl TmuxHost {
    pub fn new(timeout_ms: u64) -> Self {
        Self {
            program: TMUX_PROGRAM.to_string(),
            timeout: Duration::from_millis(timeout_ms.max(1)),
        }
    }

    /// Overrides the executable, e.g. a wrapper script on hosts with a
    /// non-default tmux socket.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    async fn run(&self, args: &[String]) -> Result<ExitStatus> {
        let subcommand = args.first().map(String::as_str).unwrap_or_default();
        let mut command = Command::new(&self.program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        tokio::time::timeout(self.timeout, command.status())
            .await
            .map_err(|_| {
                anyhow!(
                    "{} {} timed out after {}ms",
                    self.program,
                    subcommand,
                    self.timeout.as_millis()
                )
            })?
            .with_context(|| format!("failed to run {} {}", self.program, subcommand))
    }
}

#[async_trait]
impl TerminalHost for TmuxHost {
    async fn session_exists(&self, session: &str) -> Result<bool> {
        let status = self.run(&has_session_args(session)).await?;
        Ok(status.success())
    }

    async fn inject(&self, session: &str, keystrokes: &Keystrokes) -> Result<()> {
        let status = self.run(&send_keys_args(session, keystrokes)).await?;
        if !status.success() {
            bail!(
                "{} send-keys to session '{}' exited with {}",
                self.program,
                session,
                status
            );
        }
        Ok(())
    }
}

fn has_session_args(session: &str) -> Vec<String> {
    vec!["has-session".to_string(), "-t".to_string(), session.to_string()]
}

fn send_keys_args(session: &str, keystrokes: &Keystrokes) -> Vec<String> {
    let mut args = vec!["send-keys".to_string(), "-t".to_string(), session.to_string()];
    match keystrokes {
        Keystrokes::Literal(text) => {
            args.push("-l".to_string());
            args.push("--".to_string());
            args.push(text.clone());
        }
        Keystrokes::Control(key) => args.push(key.tmux_key_name().to_string()),
    }
    args
}
