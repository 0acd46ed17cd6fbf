//! Telegram update handlers.
//!
//! Each handler converts the teloxide update into a platform-neutral
//! `IncomingMessage` and hands it to the core `LinkBot`. Per-URL failures are
//! contained in the core, so handlers never report errors back to Telegram.

use std::sync::Arc;

use teloxide::{prelude::*, types::Message};

use crate::router::AppState;

mod message;

pub use message::to_incoming;

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(incoming) = to_incoming(&msg) else {
        return Ok(());
    };

    let report = state
        .link_bot
        .handle_message(&incoming, state.messenger.as_ref())
        .await;

    if report.ignored {
        tracing::trace!(chat_id = incoming.chat_id().0, "ignored message from bot");
    } else if report.scanned || report.command.is_some() {
        tracing::debug!(
            chat_id = incoming.chat_id().0,
            author = incoming.author_name.as_deref().unwrap_or("unknown"),
            command = ?report.command,
            urls = report.outcomes.len(),
            "handled message"
        );
    }

    Ok(())
}
