use std::sync::Arc;

use lnk_core::{
    alias::strategy_for, bot::LinkBot, config::Config, errors::Error, shorten::ShorteningClient,
};
use lnk_gplinks::{GplinksClient, HttpProbe};

mod health;

#[tokio::main]
async fn main() -> Result<(), lnk_core::Error> {
    lnk_core::logging::init("lnk")?;

    let cfg = Arc::new(Config::load()?);
    tracing::info!(
        api_token = %cfg.api_token,
        alias_mode = %cfg.alias_mode,
        shortener = %cfg.shortener_api_url,
        "configuration loaded"
    );

    let probe = Arc::new(HttpProbe::from_config(&cfg)?);
    let alias = strategy_for(cfg.alias_mode, &cfg.alias_prefix, probe);
    let shortener = ShorteningClient::new(Arc::new(GplinksClient::from_config(&cfg)?));
    let link_bot = Arc::new(LinkBot::new(cfg.clone(), alias, shortener));

    let listener = health::bind(&cfg.listen_addr()).await?;

    tokio::select! {
        res = health::serve(listener) => {
            res?;
            tracing::warn!("liveness endpoint stopped");
        }
        res = lnk_telegram::router::run_polling(cfg.clone(), link_bot) => {
            res.map_err(|e| Error::External(format!("telegram bot failed: {e}")))?;
            tracing::warn!("telegram dispatcher stopped");
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutting down");
        }
    }

    Ok(())
}
