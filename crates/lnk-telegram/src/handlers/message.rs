use teloxide::types::Message;

use lnk_core::domain::{ChatId, IncomingMessage, MessageId, MessageRef};

/// Convert a Telegram message (or channel post) into the core message model.
///
/// Text and media captions are both scanned; messages with neither are skipped.
/// Channel posts have no user sender and are never treated as bot-authored.
pub fn to_incoming(msg: &Message) -> Option<IncomingMessage> {
    let text = msg.text().or_else(|| msg.caption())?;

    let sender = msg.from();
    let author_is_bot = sender.map(|u| u.is_bot).unwrap_or(false);
    let author_name = sender
        .map(|u| u.username.clone().unwrap_or_else(|| u.first_name.clone()))
        .or_else(|| msg.sender_chat().and_then(|c| c.title().map(|t| t.to_string())));

    Some(IncomingMessage {
        source: MessageRef {
            chat_id: ChatId(msg.chat.id.0),
            message_id: MessageId(msg.id.0),
        },
        author_is_bot,
        author_name,
        text: text.to_string(),
        sent_at: msg.date,
    })
}
