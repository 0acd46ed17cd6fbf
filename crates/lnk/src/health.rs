//! Liveness endpoint for process supervisors.

use axum::{routing::get, Router};
use tokio::net::TcpListener;

use lnk_core::{errors::Error, Result};

pub const ALIVE_BODY: &str = "Bot is running";

pub fn router() -> Router {
    Router::new().route("/", get(alive))
}

async fn alive() -> &'static str {
    ALIVE_BODY
}

pub async fn bind(addr: &str) -> Result<TcpListener> {
    TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Config(format!("cannot listen on {addr}: {e}")))
}

pub async fn serve(listener: TcpListener) -> Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "liveness endpoint listening");
    axum::serve(listener, router()).await?;
    Ok(())
}
