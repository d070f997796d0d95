//! Typing-indicator loop that runs while a turn is pending.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::bridge_contract::ConversationId;
use crate::messaging_gateway::{swallow_transport_failure, MessagingGateway};
use crate::turn_state::{TurnStatus, TurnTracker};

/// Starts one liveness task per conversation. Each task ends as soon as the
/// turn it serves is no longer pending for its conversation.
#[derive(Clone)]
pub struct ProgressReporter {
    gateway: Arc<dyn MessagingGateway>,
    turns: Arc<TurnTracker>,
    interval: Duration,
    tasks: Arc<Mutex<HashMap<ConversationId, JoinHandle<()>>>>,
}

impl ProgressReporter {
    pub fn new(
        gateway: Arc<dyn MessagingGateway>,
        turns: Arc<TurnTracker>,
        interval: Duration,
    ) -> Self {
        Self {
            gateway,
            turns,
            interval: interval.max(Duration::from_millis(1)),
            tasks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Replaces any reporter already running for `conversation`.
    pub fn start(&self, conversation: ConversationId) {
        let handle = tokio::spawn(run_liveness_loop(
            self.gateway.clone(),
            conversation.clone(),
            self.interval,
            self.turns.subscribe(),
        ));
        let mut tasks = self.lock_tasks();
        tasks.retain(|_, handle| !handle.is_finished());
        if let Some(previous) = tasks.insert(conversation, handle) {
            previous.abort();
        }
    }

    pub fn active_count(&self) -> usize {
        let mut tasks = self.lock_tasks();
        tasks.retain(|_, handle| !handle.is_finished());
        tasks.len()
    }

    pub fn stop_all(&self) {
        for (_, handle) in self.lock_tasks().drain() {
            handle.abort();
        }
    }

    fn lock_tasks(&self) -> MutexGuard<'_, HashMap<ConversationId, JoinHandle<()>>> {
        self.tasks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

async fn run_liveness_loop(
    gateway: Arc<dyn MessagingGateway>,
    conversation: ConversationId,
    interval: Duration,
    mut status: watch::Receiver<TurnStatus>,
) {
    tracing::debug!(conversation = %conversation, "progress reporter started");
    loop {
        if !status.borrow_and_update().is_pending_for(&conversation) {
            break;
        }
        swallow_transport_failure(
            "send_liveness_signal",
            gateway.send_liveness_signal(&conversation).await,
        );
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }
    tracing::debug!(conversation = %conversation, "progress reporter stopped");
}
