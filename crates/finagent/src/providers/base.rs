use anyhow::Result;
use async_trait::async_trait;

use crate::models::message::Message;
use crate::models::tool::Tool;

pub use crate::models::message::Usage;

/// Base trait for hosted chat-model providers
#[async_trait]
pub trait Provider: Send + Sync {
    /// Generate the next message from the conversation so far
    async fn complete(
        &self,
        system: &str,
        messages: &[Message],
        tools: &[Tool],
    ) -> Result<(Message, Usage)>;
}
