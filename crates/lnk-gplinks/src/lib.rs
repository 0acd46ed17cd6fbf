//! GPLinks adapter (link shortening) and the HTTP metadata probe.
//!
//! Implements the `lnk-core` ports over `reqwest`.

use std::time::Duration;

use async_trait::async_trait;

use lnk_core::{
    alias::encode_component,
    config::Config,
    errors::Error,
    ports::ShortenApi,
    security::ApiToken,
    shorten::{ApiResponse, ShortenRequest},
    Result,
};

mod probe;

#[cfg(test)]
mod test_server;

pub use probe::HttpProbe;

const BODY_PREVIEW_CHARS: usize = 200;

pub(crate) fn http_client(timeout: Option<Duration>) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder();
    if let Some(t) = timeout {
        builder = builder.timeout(t);
    }
    builder
        .build()
        .map_err(|e| Error::External(format!("http client build failed: {e}")))
}

#[derive(Clone, Debug)]
pub struct GplinksClient {
    base_url: String,
    api_token: ApiToken,
    http: reqwest::Client,
}

impl GplinksClient {
    pub fn new(
        base_url: impl Into<String>,
        api_token: ApiToken,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        Ok(Self {
            base_url: base_url.into(),
            api_token,
            http: http_client(timeout)?,
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        Self::new(
            cfg.shortener_api_url.clone(),
            cfg.api_token.clone(),
            cfg.http_timeout,
        )
    }

    /// `{base}?api=<token>&url=<url>[&alias=<alias>]`.
    ///
    /// The alias is already percent-encoded and is appended verbatim.
    pub fn request_url(&self, req: &ShortenRequest) -> String {
        build_request_url(&self.base_url, self.api_token.expose(), req)
    }
}

fn build_request_url(base: &str, token: &str, req: &ShortenRequest) -> String {
    let sep = if base.contains('?') { '&' } else { '?' };
    let mut out = format!(
        "{base}{sep}api={}&url={}",
        encode_component(token),
        encode_component(&req.original_url)
    );
    if let Some(alias) = &req.alias {
        out.push_str("&alias=");
        out.push_str(alias.as_str());
    }
    out
}

#[async_trait]
impl ShortenApi for GplinksClient {
    async fn submit(&self, req: &ShortenRequest) -> Result<ApiResponse> {
        tracing::debug!(
            url = %req.original_url,
            alias = req.alias.as_ref().map(|a| a.as_str()).unwrap_or("-"),
            api = %self.api_token,
            "submitting to shortening service"
        );

        let resp = self
            .http
            .get(self.request_url(req))
            .send()
            .await
            .map_err(|e| {
                Error::External(format!("gplinks request error: {}", e.without_url()))
            })?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| {
                Error::External(format!("gplinks body error: {}", e.without_url()))
            })?;

        serde_json::from_str::<ApiResponse>(&body).map_err(|e| {
            Error::MalformedResponse(format!(
                "gplinks returned {status} with a non-JSON body ({e}): {}",
                body.chars().take(BODY_PREVIEW_CHARS).collect::<String>()
            ))
        })
    }
}
