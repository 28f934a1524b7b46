use crate::error::SendError;
use crate::types::UserId;
use async_trait::async_trait;

/// Outbound side of the chat transport.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_message(&self, user_id: UserId, text: &str) -> Result<(), SendError>;
}
