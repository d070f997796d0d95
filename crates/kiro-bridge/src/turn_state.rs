//! Pending-turn tracking and its on-disk markers.
//!
//! The state directory holds two single-value files: the last conversation
//! that talked to the bridge and a pending marker whose presence means an
//! agent turn is in flight. [`TurnTracker`] owns the in-memory state and
//! publishes it over a `watch` channel to progress reporters.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use anyhow::{bail, Context, Result};
use tokio::sync::watch;

use crate::bridge_contract::ConversationId;

pub const LAST_CONVERSATION_FILE: &str = "telegram_chat_id";
pub const PENDING_MARKER_FILE: &str = "telegram_pending";

static TEMP_FILE_SEQUENCE: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnState {
    pub origin_conversation: ConversationId,
    /// Unix seconds.
    pub started_at: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TurnStatus {
    #[default]
    Idle,
    Pending(TurnState),
}

impl TurnStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }

    pub fn origin(&self) -> Option<&ConversationId> {
        match self {
            Self::Idle => None,
            Self::Pending(state) => Some(&state.origin_conversation),
        }
    }

    pub fn is_pending_for(&self, conversation: &ConversationId) -> bool {
        self.origin() == Some(conversation)
    }
}

#[derive(Debug, Clone)]
pub struct TurnStateStore {
    dir: PathBuf,
}

impl TurnStateStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if dir.as_os_str().is_empty() {
            bail!("bridge state directory cannot be empty");
        }
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn last_conversation_path(&self) -> PathBuf {
        self.dir.join(LAST_CONVERSATION_FILE)
    }

    pub fn pending_marker_path(&self) -> PathBuf {
        self.dir.join(PENDING_MARKER_FILE)
    }

    pub fn load_last_conversation(&self) -> Result<Option<ConversationId>> {
        let Some(raw) = read_optional(&self.last_conversation_path())? else {
            return Ok(None);
        };
        let conversation = ConversationId::new(raw);
        Ok((!conversation.is_empty()).then_some(conversation))
    }

    pub fn save_last_conversation(&self, conversation: &ConversationId) -> Result<()> {
        write_text_atomic(&self.last_conversation_path(), conversation.as_str())
    }

    /// Returns the marker's start time when present. An unreadable timestamp
    /// still counts as pending and reads as `0`.
    pub fn load_pending_started_at(&self) -> Result<Option<u64>> {
        let Some(raw) = read_optional(&self.pending_marker_path())? else {
            return Ok(None);
        };
        Ok(Some(raw.trim().parse::<u64>().unwrap_or_default()))
    }

    pub fn write_pending_marker(&self, started_at: u64) -> Result<()> {
        write_text_atomic(&self.pending_marker_path(), &started_at.to_string())
    }

    pub fn remove_pending_marker(&self) -> Result<()> {
        let path = self.pending_marker_path();
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(error) => {
                Err(error).with_context(|| format!("failed to remove {}", path.display()))
            }
        }
    }
}

/// Single owner of the process-wide turn state.
///
/// Marker writes and channel updates happen under one lock, so the marker on
/// disk always matches the last status published.
#[derive(Debug)]
pub struct TurnTracker {
    store: TurnStateStore,
    status: watch::Sender<TurnStatus>,
    transition: Mutex<()>,
}

impl TurnTracker {
    /// Rebuilds the tracker from disk. A pending marker left by a previous
    /// process is restored against the last known conversation.
    pub fn restore(store: TurnStateStore) -> Result<Self> {
        let started_at = store.load_pending_started_at()?;
        let last_conversation = store.load_last_conversation()?;
        let initial = match (started_at, last_conversation) {
            (Some(started_at), Some(origin_conversation)) => {
                tracing::info!(
                    conversation = %origin_conversation,
                    started_at,
                    "restored pending turn from previous run"
                );
                TurnStatus::Pending(TurnState {
                    origin_conversation,
                    started_at,
                })
            }
            (Some(_), None) => {
                tracing::warn!(
                    marker = %store.pending_marker_path().display(),
                    "dropping pending marker without a known conversation"
                );
                store.remove_pending_marker()?;
                TurnStatus::Idle
            }
            (None, _) => TurnStatus::Idle,
        };
        let (status, _) = watch::channel(initial);
        Ok(Self {
            store,
            status,
            transition: Mutex::new(()),
        })
    }

    pub fn status(&self) -> TurnStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<TurnStatus> {
        self.status.subscribe()
    }

    pub fn last_conversation(&self) -> Option<ConversationId> {
        match self.store.load_last_conversation() {
            Ok(conversation) => conversation,
            Err(error) => {
                tracing::warn!(error = %format!("{error:#}"), "failed to read last conversation");
                None
            }
        }
    }

    pub fn record_conversation(&self, conversation: &ConversationId) {
        if let Err(error) = self.store.save_last_conversation(conversation) {
            tracing::warn!(
                conversation = %conversation,
                error = %format!("{error:#}"),
                "failed to persist last conversation"
            );
        }
    }

    /// Creates or overwrites the pending turn.
    pub fn begin_turn(&self, origin_conversation: ConversationId) -> TurnState {
        let state = TurnState {
            origin_conversation,
            started_at: current_unix_timestamp(),
        };
        let _transition = self.lock_transition();
        if let Err(error) = self.store.write_pending_marker(state.started_at) {
            tracing::warn!(error = %format!("{error:#}"), "failed to write pending marker");
        }
        self.status.send_replace(TurnStatus::Pending(state.clone()));
        state
    }

    /// Clears the pending turn. Returns whether one was pending.
    pub fn end_turn(&self) -> bool {
        let _transition = self.lock_transition();
        if let Err(error) = self.store.remove_pending_marker() {
            tracing::warn!(error = %format!("{error:#}"), "failed to remove pending marker");
        }
        self.status.send_replace(TurnStatus::Idle).is_pending()
    }

    fn lock_transition(&self) -> MutexGuard<'_, ()> {
        self.transition
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn current_unix_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

fn read_optional(path: &Path) -> Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(raw) => Ok(Some(raw)),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(error) => Err(error).with_context(|| format!("failed to read {}", path.display())),
    }
}

/// Temp file + rename in the same directory so readers never see a partial value.
fn write_text_atomic(path: &Path, content: &str) -> Result<()> {
    let parent_dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent_dir)
        .with_context(|| format!("failed to create {}", parent_dir.display()))?;
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("bridge-state");
    let sequence = TEMP_FILE_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    let temp_path = parent_dir.join(format!(
        ".{file_name}.tmp-{}-{sequence}",
        std::process::id()
    ));
    std::fs::write(&temp_path, content)
        .with_context(|| format!("failed to write {}", temp_path.display()))?;
    std::fs::rename(&temp_path, path).with_context(|| {
        format!(
            "failed to move {} into place at {}",
            temp_path.display(),
            path.display()
        )
    })
}
