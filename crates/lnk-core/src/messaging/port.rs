use async_trait::async_trait;

use crate::{
    domain::MessageRef,
    Result,
};

/// Cross-messenger port.
///
/// Telegram is the only implementation; replies carry a reference to the
/// message they answer so adapters can thread them.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    async fn reply_html(&self, to: MessageRef, html: &str) -> Result<MessageRef>;
}
