//! Outbound seam to the chat transport.

use std::future::Future;

use async_trait::async_trait;

use crate::bridge_contract::{ChoiceOption, ConversationId, MessageId};
use crate::bridge_error::BridgeError;

#[async_trait]
/// Chat transport operations used by the bridge. Every call is best-effort:
/// callers log failures and carry on.
pub trait MessagingGateway: Send + Sync {
    async fn send_reply(&self, conversation: &ConversationId, text: &str)
        -> Result<(), BridgeError>;

    async fn send_choice_prompt(
        &self,
        conversation: &ConversationId,
        text: &str,
        choices: &[ChoiceOption],
    ) -> Result<(), BridgeError>;

    async fn send_liveness_signal(&self, conversation: &ConversationId) -> Result<(), BridgeError>;

    async fn mark_acknowledged(
        &self,
        conversation: &ConversationId,
        message: &MessageId,
    ) -> Result<(), BridgeError>;

    async fn acknowledge_selection(&self, selection_id: &str) -> Result<(), BridgeError>;
}

/// Logs and drops a failed gateway call.
pub(crate) fn swallow_transport_failure(operation: &'static str, result: Result<(), BridgeError>) {
    if let Err(error) = result {
        tracing::warn!(
            operation,
            reason_code = error.reason_code(),
            error = %error,
            "messaging gateway call failed"
        );
    }
}

/// Runs a gateway call on its own task so the caller never waits on the transport.
pub(crate) fn spawn_best_effort<F>(operation: &'static str, call: F)
where
    F: Future<Output = Result<(), BridgeError>> + Send + 'static,
{
    tokio::spawn(async move {
        swallow_transport_failure(operation, call.await);
    });
}
