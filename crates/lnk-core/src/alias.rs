//! Short-alias strategies for the shortening service.
//!
//! A friendly alias is only a preference: the shortening client drops it on
//! collision, so strategies never need to check availability themselves.

use std::{
    fmt,
    str::FromStr,
    sync::{
        atomic::{AtomicI64, Ordering},
        Arc, OnceLock,
    },
};

use async_trait::async_trait;
use chrono::Utc;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regex::Regex;

use crate::{errors::Error, filename::FilenameResolver, ports::MetadataProbe, Result};

/// Characters left unescaped by JavaScript's `encodeURIComponent`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encode a string for use as a single query-string component.
pub fn encode_component(s: &str) -> String {
    utf8_percent_encode(s, COMPONENT).to_string()
}

/// A URL-safe (already percent-encoded) alias.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Alias(String);

impl Alias {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Alias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid regex"))
}

fn extension_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\.[^/.]+$").expect("valid regex"))
}

/// Deterministic alias from a filename: `"My File.pdf"` → `My_File`.
pub fn build_alias(filename: &str) -> Alias {
    let underscored = whitespace_re().replace_all(filename, "_");
    let stem = extension_re().replace(&underscored, "");
    Alias(encode_component(&stem))
}

/// Alias from a prefix and a millisecond timestamp: `lnk_1700000000000`.
pub fn build_timestamp_alias(prefix: &str, millis: i64) -> Alias {
    Alias(format!("{}{millis}", encode_component(prefix)))
}

// ============== Strategy Selection ==============

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AliasMode {
    /// Alias derived from the resolved filename; URLs whose filename cannot be
    /// resolved are skipped.
    Filename,
    /// Prefix + wall-clock milliseconds; never depends on the network.
    #[default]
    Timestamp,
    /// Let the service assign the alias.
    None,
}

impl AliasMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AliasMode::Filename => "filename",
            AliasMode::Timestamp => "timestamp",
            AliasMode::None => "none",
        }
    }
}

impl fmt::Display for AliasMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AliasMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "filename" => Ok(AliasMode::Filename),
            "timestamp" => Ok(AliasMode::Timestamp),
            "none" | "off" => Ok(AliasMode::None),
            other => Err(format!(
                "unknown alias mode {other:?} (expected filename, timestamp or none)"
            )),
        }
    }
}

/// Produces the preferred alias for one URL.
///
/// `Ok(None)` means "submit without alias"; `Err` means the URL should be skipped.
#[async_trait]
pub trait AliasStrategy: Send + Sync {
    fn mode(&self) -> AliasMode;

    async fn alias_for(&self, url: &str) -> Result<Option<Alias>>;
}

pub fn strategy_for(
    mode: AliasMode,
    prefix: &str,
    probe: Arc<dyn MetadataProbe>,
) -> Arc<dyn AliasStrategy> {
    match mode {
        AliasMode::Filename => Arc::new(FilenameAlias::new(FilenameResolver::new(probe))),
        AliasMode::Timestamp => Arc::new(TimestampAlias::new(prefix)),
        AliasMode::None => Arc::new(NoAlias),
    }
}

pub struct FilenameAlias {
    resolver: FilenameResolver,
}

impl FilenameAlias {
    pub fn new(resolver: FilenameResolver) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl AliasStrategy for FilenameAlias {
    fn mode(&self) -> AliasMode {
        AliasMode::Filename
    }

    async fn alias_for(&self, url: &str) -> Result<Option<Alias>> {
        match self.resolver.resolve(url).await {
            Some(name) if !name.trim().is_empty() => Ok(Some(build_alias(&name))),
            _ => Err(Error::FilenameUnresolved(url.to_string())),
        }
    }
}

pub struct TimestampAlias {
    prefix: String,
    last_millis: AtomicI64,
}

impl TimestampAlias {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            last_millis: AtomicI64::new(i64::MIN),
        }
    }

    /// Wall-clock millis, bumped past the previous value so that two calls in
    /// the same millisecond still get distinct aliases.
    fn next_millis(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let prev = self
            .last_millis
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |prev| {
                Some(now.max(prev.saturating_add(1)))
            })
            .unwrap_or(now);
        now.max(prev.saturating_add(1))
    }
}

#[async_trait]
impl AliasStrategy for TimestampAlias {
    fn mode(&self) -> AliasMode {
        AliasMode::Timestamp
    }

    async fn alias_for(&self, _url: &str) -> Result<Option<Alias>> {
        Ok(Some(build_timestamp_alias(&self.prefix, self.next_millis())))
    }
}

pub struct NoAlias;

#[async_trait]
impl AliasStrategy for NoAlias {
    fn mode(&self) -> AliasMode {
        AliasMode::None
    }

    async fn alias_for(&self, _url: &str) -> Result<Option<Alias>> {
        Ok(None)
    }
}
