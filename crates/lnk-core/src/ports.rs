use async_trait::async_trait;

use crate::{
    shorten::{ApiResponse, ShortenRequest},
    Result,
};

/// Headers of interest from a metadata-only (HEAD) request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProbeResponse {
    /// Whether the server answered with a 2xx status.
    pub success: bool,
    pub content_disposition: Option<String>,
}

/// Hexagonal port for the metadata probe used by filename resolution.
#[async_trait]
pub trait MetadataProbe: Send + Sync {
    async fn probe(&self, url: &str) -> Result<ProbeResponse>;
}

/// Hexagonal port for the link-shortening service.
///
/// Implementations own the API secret. Transport failures and undecodable
/// bodies are `Err`; service-level errors arrive as an `ApiResponse` with
/// `status == "error"`.
#[async_trait]
pub trait ShortenApi: Send + Sync {
    async fn submit(&self, req: &ShortenRequest) -> Result<ApiResponse>;
}
