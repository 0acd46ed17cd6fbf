use chrono::{DateTime, Utc};

/// Chat id (numeric). Identifies the channel/group a message was posted in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// Message id (numeric), unique within a chat.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub i32);

/// A stable reference to a chat message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: MessageId,
}

/// Platform-neutral inbound message.
///
/// Adapters build this from their native update type; the core never sees
/// platform structs.
#[derive(Clone, Debug)]
pub struct IncomingMessage {
    pub source: MessageRef,
    pub author_is_bot: bool,
    pub author_name: Option<String>,
    pub text: String,
    pub sent_at: DateTime<Utc>,
}

impl IncomingMessage {
    pub fn chat_id(&self) -> ChatId {
        self.source.chat_id
    }
}
