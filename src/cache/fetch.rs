//! The network seam for the resource cache.
//!
//! The fetch strategies only care about "give me the bytes for this
//! request or fail", so they run against the [`Fetch`] trait. The real
//! implementation is [`HttpFetcher`] on `reqwest`; tests substitute a mock
//! that counts calls.

use reqwest::{header, Client, Url};
use thiserror::Error;

/// What the caller expects the response to be. Document requests are
/// top-level HTML-like pages and get the network-first treatment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
    Document,
    Asset,
}

/// An incoming resource request as seen by the cache manager.
#[derive(Debug, Clone)]
pub struct ResourceRequest {
    pub url: Url,
    pub mode: RequestMode,
}

impl ResourceRequest {
    pub fn document(url: Url) -> Self {
        Self {
            url,
            mode: RequestMode::Document,
        }
    }

    pub fn asset(url: Url) -> Self {
        Self {
            url,
            mode: RequestMode::Asset,
        }
    }
}

/// Bytes plus content type, as returned to the caller and stored in the
/// cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedResource {
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(u16),
}

/// Network access used by the fetch strategies.
pub trait Fetch {
    fn fetch(
        &self,
        request: &ResourceRequest,
    ) -> impl std::future::Future<Output = Result<FetchedResource, FetchError>> + Send;
}

/// `reqwest`-backed fetcher. Clone is cheap - reqwest::Client uses Arc
/// internally for connection pooling.
///
/// No request timeout is configured: a hung fetch is handled by its own
/// failure path (the strategies fall back to cache), not by a deadline.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, FetchError> {
        let client = Client::builder().build()?;
        Ok(Self { client })
    }
}

impl Fetch for HttpFetcher {
    async fn fetch(&self, request: &ResourceRequest) -> Result<FetchedResource, FetchError> {
        let response = self.client.get(request.url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());
        let body = response.bytes().await?.to_vec();

        Ok(FetchedResource { content_type, body })
    }
}
