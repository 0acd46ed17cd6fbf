use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};

use lnk_core::{bot::LinkBot, config::Config, messaging::port::MessagingPort};

use crate::handlers;
use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    pub link_bot: Arc<LinkBot>,
    pub messenger: Arc<dyn MessagingPort>,
}

/// Long-poll Telegram until the dispatcher stops.
///
/// Updates from one chat are handled in order; different chats run concurrently.
pub async fn run_polling(cfg: Arc<Config>, link_bot: Arc<LinkBot>) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.bot_token.expose());

    // Basic startup info.
    match bot.get_me().await {
        Ok(me) => tracing::info!(username = %me.username(), "bot online, monitoring urls"),
        Err(e) => tracing::warn!(error = %e, "could not fetch bot identity"),
    }
    tracing::info!(
        chat_id = cfg.shorten_chat_id.0,
        prefix = %cfg.command_prefix,
        alias_mode = %cfg.alias_mode,
        "listening for links"
    );

    let messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));

    let state = Arc::new(AppState {
        link_bot,
        messenger,
    });

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(handlers::handle_message))
        .branch(Update::filter_channel_post().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch()
        .await;

    Ok(())
}
