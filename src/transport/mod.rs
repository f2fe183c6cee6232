//! Transport abstraction consumed by the signing and request layers.
//!
//! Connection pooling, TLS, proxies, timeouts and cancellation all live
//! behind [`Transport`]; this crate only issues GETs and reads bodies.

pub mod reqwest_client;

use async_trait::async_trait;
use bytes::Bytes;
use http::HeaderMap;
use thiserror::Error;
use url::Url;

pub use reqwest_client::ReqwestTransport;

/// Contract for the HTTP transport collaborator.
///
/// Implementations should keep cookies between calls so consecutive requests
/// look like one browser session.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &Url, headers: &HeaderMap) -> Result<TransportResponse, TransportError>;
}

/// Minimal response representation returned by the transport abstraction.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Bytes,
    pub url: Url,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<Bytes>, url: Url) -> Self {
        Self {
            status,
            body: body.into(),
            url,
        }
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// IO/TLS level failure. Opaque to this crate; never retried here.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("http transport error: {0}")]
    Transport(String),
}
