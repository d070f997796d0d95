//! Fire-and-forget handle bound to one named terminal session.

use std::sync::Arc;

use crate::terminal_host::{ControlKey, Keystrokes, TerminalHost};

#[derive(Clone)]
pub struct SessionHandle {
    host: Arc<dyn TerminalHost>,
    session: String,
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl SessionHandle {
    pub fn new(host: Arc<dyn TerminalHost>, session: impl Into<String>) -> Self {
        Self {
            host,
            session: session.into(),
        }
    }

    pub fn session_name(&self) -> &str {
        &self.session
    }

    /// Queries the host on every call. Host failures read as "not running".
    pub async fn exists(&self) -> bool {
        match self.host.session_exists(&self.session).await {
            Ok(exists) => exists,
            Err(error) => {
                tracing::warn!(
                    session = %self.session,
                    error = %format!("{error:#}"),
                    "terminal host existence check failed; treating session as missing"
                );
                false
            }
        }
    }

    /// Injects `text` verbatim. Control sequences inside `text` are not interpreted.
    pub async fn send_text(&self, text: &str) {
        self.inject(Keystrokes::literal(text)).await;
    }

    pub async fn send_key(&self, key: ControlKey) {
        tracing::debug!(session = %self.session, key = key.as_str(), "sending control key");
        self.inject(Keystrokes::Control(key)).await;
    }

    async fn inject(&self, keystrokes: Keystrokes) {
        if let Err(error) = self.host.inject(&self.session, &keystrokes).await {
            tracing::warn!(
                session = %self.session,
                control = keystrokes.is_control(),
                error = %format!("{error:#}"),
                "terminal host injection failed"
            );
        }
    }
}
