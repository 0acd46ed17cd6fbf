//! Shortening-service submission with a single alias-collision fallback.

use std::sync::Arc;

use serde::Deserialize;

use crate::{alias::Alias, ports::ShortenApi, Result};

/// Substring the service uses to report that a requested alias is taken.
pub const ALIAS_COLLISION_MARKER: &str = "Alias already exists";

/// One submission to the shortening service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShortenRequest {
    pub original_url: String,
    pub alias: Option<Alias>,
}

impl ShortenRequest {
    pub fn new(original_url: impl Into<String>, alias: Option<Alias>) -> Self {
        Self {
            original_url: original_url.into(),
            alias,
        }
    }

    pub fn without_alias(&self) -> Self {
        Self {
            original_url: self.original_url.clone(),
            alias: None,
        }
    }
}

/// Decoded JSON body of the shortening service.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct ApiResponse {
    #[serde(default)]
    pub status: String,
    #[serde(rename = "shortenedUrl", default)]
    pub shortened_url: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ApiResponse {
    pub fn is_error(&self) -> bool {
        self.status == "error"
    }

    pub fn is_alias_collision(&self) -> bool {
        self.is_error()
            && self
                .message
                .as_deref()
                .is_some_and(|m| m.contains(ALIAS_COLLISION_MARKER))
    }

    fn error_reason(&self) -> String {
        self.message
            .clone()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| "shortening service returned an error".to_string())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShortenResult {
    Success { short_url: String },
    Failure { reason: String },
}

impl ShortenResult {
    pub fn is_success(&self) -> bool {
        matches!(self, ShortenResult::Success { .. })
    }
}

/// Client for the alias-retry protocol on top of a `ShortenApi` port.
#[derive(Clone)]
pub struct ShorteningClient {
    api: Arc<dyn ShortenApi>,
}

impl ShorteningClient {
    pub fn new(api: Arc<dyn ShortenApi>) -> Self {
        Self { api }
    }

    /// Shorten `original_url`, preferring `preferred_alias` when given.
    ///
    /// An alias collision on a request that carried an alias is retried exactly
    /// once without the alias; the retry's outcome is final. Transport errors
    /// are returned as `Err` and never retried.
    pub async fn shorten(
        &self,
        original_url: &str,
        preferred_alias: Option<Alias>,
    ) -> Result<ShortenResult> {
        let req = ShortenRequest::new(original_url, preferred_alias);
        let resp = self.api.submit(&req).await?;

        if resp.is_alias_collision() && req.alias.is_some() {
            tracing::info!(
                url = %original_url,
                alias = %req.alias.as_ref().map(Alias::as_str).unwrap_or_default(),
                "alias already taken; retrying without alias"
            );
            let retry = self.api.submit(&req.without_alias()).await?;
            return Ok(interpret(retry));
        }

        Ok(interpret(resp))
    }
}

fn interpret(resp: ApiResponse) -> ShortenResult {
    if resp.is_error() {
        return ShortenResult::Failure {
            reason: resp.error_reason(),
        };
    }

    match resp.shortened_url.filter(|u| !u.trim().is_empty()) {
        Some(short_url) => ShortenResult::Success { short_url },
        None => ShortenResult::Failure {
            reason: "response is missing shortenedUrl".to_string(),
        },
    }
}
