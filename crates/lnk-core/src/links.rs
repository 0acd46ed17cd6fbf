//! URL discovery in chat text.

use std::sync::OnceLock;

use regex::Regex;
use url::Url;

use crate::{errors::Error, Result};

fn url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"https?://[^\s]+").expect("valid regex"))
}

/// All `http(s)://` URLs in `text`, in discovery order.
///
/// Duplicates are kept: every occurrence is shortened on its own.
pub fn extract_urls(text: &str) -> Vec<String> {
    url_regex()
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Hostname of an absolute URL (`https://example.com/a.zip` → `example.com`).
pub fn hostname(raw: &str) -> Result<String> {
    let url = Url::parse(raw).map_err(|e| Error::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    url.host_str()
        .map(|h| h.to_string())
        .ok_or_else(|| Error::InvalidUrl {
            url: raw.to_string(),
            reason: "no host".to_string(),
        })
}
