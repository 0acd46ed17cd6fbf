use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_DISPOSITION;

use lnk_core::{
    config::Config,
    errors::Error,
    ports::{MetadataProbe, ProbeResponse},
    Result,
};

use crate::http_client;

/// Metadata probe over a plain `HEAD` request. No retries.
#[derive(Clone, Debug)]
pub struct HttpProbe {
    http: reqwest::Client,
}

impl HttpProbe {
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        Ok(Self {
            http: http_client(timeout)?,
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        Self::new(cfg.http_timeout)
    }
}

#[async_trait]
impl MetadataProbe for HttpProbe {
    async fn probe(&self, url: &str) -> Result<ProbeResponse> {
        let resp = self
            .http
            .head(url)
            .send()
            .await
            .map_err(|e| Error::External(format!("metadata probe error: {e}")))?;

        let content_disposition = resp
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        Ok(ProbeResponse {
            success: resp.status().is_success(),
            content_disposition,
        })
    }
}
