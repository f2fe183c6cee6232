//! Reqwest-based implementation of the [`Transport`] trait.
//!
//! Provides a thin adapter around `reqwest::Client` that converts between the
//! `http` header types used by the signing layer and the concrete transport.

use async_trait::async_trait;
use http::HeaderMap as HttpHeaderMap;
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use url::Url;

use super::{Transport, TransportError, TransportResponse};

/// Reqwest-backed transport with a shared cookie jar.
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, TransportError> {
        let client = Client::builder()
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(|err| TransportError::Transport(err.to_string()))?;

        Ok(Self { client })
    }

    /// Wrap an existing reqwest client, e.g. one configured with a proxy or
    /// custom timeouts.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &Url, headers: &HttpHeaderMap) -> Result<TransportResponse, TransportError> {
        let response = self
            .client
            .get(url.as_str())
            .headers(convert_headers(headers)?)
            .send()
            .await
            .map_err(|err| TransportError::Transport(err.to_string()))?;

        let status = response.status().as_u16();
        let final_url = response.url().clone();
        let body = response
            .bytes()
            .await
            .map_err(|err| TransportError::Transport(err.to_string()))?;

        Ok(TransportResponse::new(status, body, final_url))
    }
}

fn convert_headers(headers: &HttpHeaderMap) -> Result<HeaderMap, TransportError> {
    let mut map = HeaderMap::new();
    for (name, value) in headers.iter() {
        let name = HeaderName::from_bytes(name.as_str().as_bytes())
            .map_err(|err| TransportError::Transport(err.to_string()))?;
        let value = HeaderValue::from_bytes(value.as_bytes())
            .map_err(|err| TransportError::Transport(err.to_string()))?;
        map.insert(name, value);
    }
    Ok(map)
}
