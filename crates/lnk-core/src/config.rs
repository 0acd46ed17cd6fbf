use std::{env, time::Duration};

use crate::{alias::AliasMode, domain::ChatId, errors::Error, security::ApiToken, Result};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_COMMAND_PREFIX: &str = "u!";
pub const DEFAULT_ALIAS_PREFIX: &str = "lnk_";
pub const DEFAULT_SHORTENER_API_URL: &str = "https://api.gplinks.com/api";

/// Typed configuration, built once at startup and shared as `Arc<Config>`.
#[derive(Clone, Debug)]
pub struct Config {
    // Chat platform
    pub bot_token: ApiToken,
    pub shorten_chat_id: ChatId,
    pub command_prefix: String,

    // Shortening service
    pub api_token: ApiToken,
    pub shortener_api_url: String,
    pub alias_mode: AliasMode,
    pub alias_prefix: String,
    pub http_timeout: Option<Duration>,

    // Liveness endpoint
    pub bind_addr: String,
    pub port: u16,
}

impl Config {
    /// Load from the process environment, reading `.env` first if present.
    ///
    /// Values already set in the environment win over `.env`.
    pub fn load() -> Result<Self> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
            Err(e) if e.not_found() => {}
            Err(e) => return Err(Error::Config(format!(".env could not be read: {e}"))),
        }

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the environment in production, a map in tests).
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| get(key).and_then(non_empty);

        // Required
        let bot_token = get("BOT_TOKEN").ok_or_else(|| missing("BOT_TOKEN"))?;
        let shorten_chat_id = get("SHORTEN_CHANNEL_ID")
            .ok_or_else(|| missing("SHORTEN_CHANNEL_ID"))
            .and_then(|v| parse_value::<i64>("SHORTEN_CHANNEL_ID", &v))?;
        let api_token = get("API_TOKEN").ok_or_else(|| missing("API_TOKEN"))?;

        // Optional with defaults
        let port = match get("PORT") {
            Some(v) => parse_value::<u16>("PORT", &v)?,
            None => DEFAULT_PORT,
        };
        let bind_addr = get("BIND_ADDR").unwrap_or_else(|| "0.0.0.0".to_string());
        let command_prefix =
            get("COMMAND_PREFIX").unwrap_or_else(|| DEFAULT_COMMAND_PREFIX.to_string());
        let alias_mode = match get("ALIAS_MODE") {
            Some(v) => parse_value::<AliasMode>("ALIAS_MODE", &v)?,
            None => AliasMode::default(),
        };
        let alias_prefix = get("ALIAS_PREFIX").unwrap_or_else(|| DEFAULT_ALIAS_PREFIX.to_string());
        let shortener_api_url =
            get("SHORTENER_API_URL").unwrap_or_else(|| DEFAULT_SHORTENER_API_URL.to_string());
        let http_timeout = get("HTTP_TIMEOUT_SECS")
            .map(|v| parse_value::<u64>("HTTP_TIMEOUT_SECS", &v))
            .transpose()?
            .map(Duration::from_secs);

        Ok(Self {
            bot_token: ApiToken::new(bot_token),
            shorten_chat_id: ChatId(shorten_chat_id),
            command_prefix,
            api_token: ApiToken::new(api_token),
            shortener_api_url,
            alias_mode,
            alias_prefix,
            http_timeout,
            bind_addr,
            port,
        })
    }

    /// `host:port` for the liveness endpoint.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

fn missing(key: &str) -> Error {
    Error::Config(format!("{key} environment variable is required"))
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| Error::Config(format!("{key} has an invalid value {raw:?}: {e}")))
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
