//! Human-readable filename for a URL: Content-Disposition first, URL path second.

use std::sync::Arc;

use percent_encoding::percent_decode_str;
use url::Url;

use crate::ports::MetadataProbe;

/// Resolves a display filename for a URL with one HEAD-style probe.
#[derive(Clone)]
pub struct FilenameResolver {
    probe: Arc<dyn MetadataProbe>,
}

impl FilenameResolver {
    pub fn new(probe: Arc<dyn MetadataProbe>) -> Self {
        Self { probe }
    }

    /// Filename from the `content-disposition` header, else the last URL path segment.
    ///
    /// Fails soft: probe errors and non-2xx answers are logged and yield `None`.
    /// An empty path yields `Some("")`.
    pub async fn resolve(&self, url: &str) -> Option<String> {
        let resp = match self.probe.probe(url).await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(%url, error = %e, "metadata probe failed");
                return None;
            }
        };

        if !resp.success {
            tracing::warn!(%url, "metadata probe returned a non-success status");
            return None;
        }

        if let Some(name) = resp
            .content_disposition
            .as_deref()
            .and_then(parse_content_disposition_filename)
        {
            return Some(name);
        }

        filename_from_url_path(url)
    }
}

/// Extracts the filename from a raw Content-Disposition header value.
///
/// Supports:
/// - `filename="value"` (quoted; returned literally, `\"` and `\\` unescaped)
/// - `filename=value` (token)
/// - `filename*=UTF-8''percent-encoded` (RFC 5987; decoded)
///
/// A non-empty `filename` wins; `filename*` is only used when no `filename`
/// parameter is present.
pub fn parse_content_disposition_filename(header_value: &str) -> Option<String> {
    let mut plain: Option<String> = None;
    let mut extended: Option<String> = None;

    for param in split_params(header_value) {
        let Some((name, v)) = param.split_once('=') else {
            continue;
        };
        let name = name.trim().to_ascii_lowercase();
        let v = v.trim();

        match name.as_str() {
            "filename*" => {
                let Some((charset, rest)) = v.split_once("''") else {
                    continue;
                };
                if !charset.eq_ignore_ascii_case("utf-8") {
                    continue;
                }
                let decoded = percent_decode_str(rest).decode_utf8_lossy().into_owned();
                if !decoded.is_empty() {
                    extended = Some(decoded);
                }
            }
            "filename" => {
                let value = match v.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
                    Some(inner) => unescape_quoted(inner),
                    None => v.to_string(),
                };
                if !value.is_empty() {
                    plain = Some(value);
                }
            }
            _ => {}
        }
    }

    plain.or(extended)
}

/// Last `/`-separated segment of the URL path, percent-decoded.
///
/// `https://x.com/files/doc.zip` → `doc.zip`; `https://x.com/` → `""`.
/// Decoding happens before alias building, so `My%20File.pdf` becomes the
/// alias `My_File` rather than the double-encoded `My%2520File`.
pub fn filename_from_url_path(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let last = parsed.path().rsplit('/').next().unwrap_or("");
    Some(percent_decode_str(last).decode_utf8_lossy().into_owned())
}

/// Split header parameters on `;`, ignoring separators inside quoted strings.
fn split_params(value: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0usize;
    let mut in_quotes = false;
    let mut escaped = false;

    for (i, c) in value.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => {
                out.push(value[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    out.push(value[start..].trim());
    out
}

fn unescape_quoted(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(&next) = chars.peek() {
                if next == '"' || next == '\\' {
                    out.push(next);
                    chars.next();
                    continue;
                }
            }
        }
        out.push(c);
    }
    out
}
