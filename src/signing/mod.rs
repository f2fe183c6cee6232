//! WBI request signing.
//!
//! Every signed call needs a mixin key derived from two rotating fragments
//! published on the nav endpoint. [`MixinKeyResolver`] fetches those
//! fragments, derives the key and produces `w_rid`/`wts` for a parameter set.

pub mod cache;
pub mod mixin;
pub mod wbi;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use http::HeaderMap;
use thiserror::Error;
use url::Url;

use crate::transport::{Transport, TransportError};

pub use cache::MixinKeyCache;
pub use mixin::{KeyFragments, MIXIN_KEY_LEN};
pub use wbi::{SIGNATURE_KEY, TIMESTAMP_KEY, WbiSignature, sign_with_key};

/// Endpoint publishing the current key fragments.
pub const DEFAULT_METADATA_URL: &str = "https://api.bilibili.com/x/web-interface/nav";

/// Failures while obtaining key material. Never retried at this layer.
#[derive(Debug, Error)]
pub enum SigningError {
    #[error("metadata fetch failed: {0}")]
    Transport(#[from] TransportError),
    #[error("metadata endpoint answered with status {0}")]
    Status(u16),
    #[error("metadata response lacks field '{0}'")]
    MissingField(&'static str),
    #[error("key fragments must total 64 characters, got {0}")]
    MalformedKey(usize),
    #[error("invalid metadata url: {0}")]
    Url(#[from] url::ParseError),
}

/// Fetches key material and signs parameter sets.
pub struct MixinKeyResolver {
    transport: Arc<dyn Transport>,
    metadata_url: Url,
    cache: Option<MixinKeyCache>,
}

impl MixinKeyResolver {
    pub fn new(transport: Arc<dyn Transport>) -> Result<Self, SigningError> {
        Ok(Self::with_metadata_url(transport, Url::parse(DEFAULT_METADATA_URL)?))
    }

    pub fn with_metadata_url(transport: Arc<dyn Transport>, metadata_url: Url) -> Self {
        Self {
            transport,
            metadata_url,
            cache: None,
        }
    }

    /// Keep derived keys for `ttl` instead of refetching on every signature.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache = Some(MixinKeyCache::new(ttl));
        self
    }

    pub fn metadata_url(&self) -> &Url {
        &self.metadata_url
    }

    /// Fetch the current fragments from the metadata endpoint.
    pub async fn fetch_fragments(&self, headers: &HeaderMap) -> Result<KeyFragments, SigningError> {
        let response = self.transport.get(&self.metadata_url, headers).await?;
        if response.status != 200 {
            return Err(SigningError::Status(response.status));
        }
        KeyFragments::from_body(&response.text())
    }

    /// Current mixin key, served from the cache when one is configured.
    pub async fn mixin_key(&self, headers: &HeaderMap) -> Result<String, SigningError> {
        if let Some(cached) = self.cache.as_ref().and_then(MixinKeyCache::get) {
            return Ok(cached);
        }

        let key = self.fetch_fragments(headers).await?.mixin_key()?;
        log::debug!("derived mixin key from {}", self.metadata_url);
        if let Some(cache) = &self.cache {
            cache.store(key.clone());
        }
        Ok(key)
    }

    /// Sign `params` at the current Unix time.
    pub async fn sign(
        &self,
        params: &BTreeMap<String, String>,
        headers: &HeaderMap,
    ) -> Result<WbiSignature, SigningError> {
        let mixin_key = self.mixin_key(headers).await?;
        let wts = chrono::Utc::now().timestamp();
        Ok(sign_with_key(
            params.iter().map(|(k, v)| (k.as_str(), v.as_str())),
            &mixin_key,
            wts,
        ))
    }

    /// `base` with `params` (plus any query already on `base`) and the
    /// signature appended.
    pub async fn signed_url(
        &self,
        base: &Url,
        params: &BTreeMap<String, String>,
        headers: &HeaderMap,
    ) -> Result<Url, SigningError> {
        let merged = merge_query(base, params);
        let signature = self.sign(&merged, headers).await?;
        Ok(apply_signature(base, &merged, &signature))
    }

    /// Drop any cached key, e.g. after the origin rejected a signature.
    pub fn invalidate(&self) {
        if let Some(cache) = &self.cache {
            cache.invalidate();
        }
    }
}

/// Caller params override pairs already present on `base`. Stale `w_rid`
/// and `wts` values are dropped from both sources.
pub fn merge_query(base: &Url, params: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    let mut merged: BTreeMap<String, String> = base
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    merged.extend(params.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged.retain(|k, _| !is_signature_key(k));
    merged
}

fn is_signature_key(key: &str) -> bool {
    key == SIGNATURE_KEY || key == TIMESTAMP_KEY
}

/// Rebuild `base`'s query from the signed parameter set.
pub fn apply_signature(
    base: &Url,
    params: &BTreeMap<String, String>,
    signature: &WbiSignature,
) -> Url {
    let mut url = base.clone();
    url.set_query(None);
    {
        let mut pairs = url.query_pairs_mut();
        pairs.extend_pairs(params.iter().filter(|(k, _)| k.as_str() != TIMESTAMP_KEY));
        pairs.extend_pairs(signature.query_pairs());
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::TransportResponse;
    use async_trait::async_trait;
    use std::sync::Mutex;

    const NAV_BODY: &str = r#"{"code":-101,"data":{"wbi_img":{"img_url":"https://i0.hdslb.com/bfs/wbi/7cd084941338484aae1ad9425b84077c.png","sub_url":"https://i0.hdslb.com/bfs/wbi/4932caff0ff746eab6f01bf08b70ac45.png"}}}"#;

    struct NavStub {
        status: u16,
        body: &'static str,
        calls: Mutex<usize>,
    }

    impl NavStub {
        fn new(status: u16, body: &'static str) -> Self {
            Self {
                status,
                body,
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl Transport for NavStub {
        async fn get(&self, url: &Url, _headers: &HeaderMap) -> Result<TransportResponse, TransportError> {
            *self.calls.lock().unwrap() += 1;
            Ok(TransportResponse::new(self.status, self.body, url.clone()))
        }
    }

    fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn refetches_fragments_for_every_signature() {
        let stub = Arc::new(NavStub::new(200, NAV_BODY));
        let resolver = MixinKeyResolver::new(stub.clone()).unwrap();

        let set = params(&[("foo", "114")]);
        resolver.sign(&set, &HeaderMap::new()).await.unwrap();
        resolver.sign(&set, &HeaderMap::new()).await.unwrap();
        assert_eq!(stub.calls(), 2);
    }

    #[tokio::test]
    async fn cache_suppresses_refetch() {
        let stub = Arc::new(NavStub::new(200, NAV_BODY));
        let resolver = MixinKeyResolver::new(stub.clone())
            .unwrap()
            .with_cache_ttl(Duration::from_secs(3600));

        let set = params(&[("foo", "114")]);
        resolver.sign(&set, &HeaderMap::new()).await.unwrap();
        resolver.sign(&set, &HeaderMap::new()).await.unwrap();
        assert_eq!(stub.calls(), 1);

        resolver.invalidate();
        resolver.sign(&set, &HeaderMap::new()).await.unwrap();
        assert_eq!(stub.calls(), 2);
    }

    #[tokio::test]
    async fn signature_matches_pure_computation() {
        let stub = Arc::new(NavStub::new(200, NAV_BODY));
        let resolver = MixinKeyResolver::new(stub).unwrap();

        let set = params(&[("foo", "114"), ("bar", "514"), ("zab", "1919810")]);
        let signature = resolver.sign(&set, &HeaderMap::new()).await.unwrap();
        let expected = sign_with_key(
            [("foo", "114"), ("bar", "514"), ("zab", "1919810")],
            "ea1db124af3c7062474693fa704f4ff8",
            signature.wts,
        );
        assert_eq!(signature, expected);
    }

    #[tokio::test]
    async fn non_200_metadata_is_fatal() {
        let stub = Arc::new(NavStub::new(503, "unavailable"));
        let resolver = MixinKeyResolver::new(stub).unwrap();
        let result = resolver.sign(&BTreeMap::new(), &HeaderMap::new()).await;
        assert!(matches!(result, Err(SigningError::Status(503))));
    }

    #[tokio::test]
    async fn unparseable_metadata_is_fatal() {
        let stub = Arc::new(NavStub::new(200, r#"{"code":0,"data":{}}"#));
        let resolver = MixinKeyResolver::new(stub).unwrap();
        let result = resolver.sign(&BTreeMap::new(), &HeaderMap::new()).await;
        assert!(matches!(result, Err(SigningError::MissingField("img_url"))));
    }

    #[tokio::test]
    async fn signed_url_carries_params_and_signature() {
        let stub = Arc::new(NavStub::new(200, NAV_BODY));
        let resolver = MixinKeyResolver::new(stub).unwrap();
        let base = Url::parse("https://api.bilibili.com/x/space/wbi/arc/search?mid=2").unwrap();

        let url = resolver
            .signed_url(&base, &params(&[("pn", "1")]), &HeaderMap::new())
            .await
            .unwrap();

        let pairs: BTreeMap<String, String> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(pairs.get("mid").map(String::as_str), Some("2"));
        assert_eq!(pairs.get("pn").map(String::as_str), Some("1"));
        assert_eq!(pairs.get(SIGNATURE_KEY).map(String::len), Some(32));
        assert!(pairs.contains_key(TIMESTAMP_KEY));
    }

    #[tokio::test]
    async fn stale_signature_params_are_replaced() {
        let stub = Arc::new(NavStub::new(200, NAV_BODY));
        let resolver = MixinKeyResolver::new(stub).unwrap();
        let base = Url::parse("https://api.bilibili.com/x/space/wbi/acc/info?wts=1").unwrap();

        let url = resolver
            .signed_url(
                &base,
                &params(&[("mid", "2"), (SIGNATURE_KEY, "stale"), (TIMESTAMP_KEY, "42")]),
                &HeaderMap::new(),
            )
            .await
            .unwrap();

        let signatures: Vec<String> = url
            .query_pairs()
            .filter(|(k, _)| k == SIGNATURE_KEY)
            .map(|(_, v)| v.into_owned())
            .collect();
        let timestamps: Vec<String> = url
            .query_pairs()
            .filter(|(k, _)| k == TIMESTAMP_KEY)
            .map(|(_, v)| v.into_owned())
            .collect();
        assert_eq!(signatures.len(), 1);
        assert_ne!(signatures[0], "stale");
        assert_eq!(timestamps.len(), 1);
        assert_ne!(timestamps[0], "42");

        let expected = sign_with_key(
            [("mid", "2")],
            "ea1db124af3c7062474693fa704f4ff8",
            timestamps[0].parse().unwrap(),
        );
        assert_eq!(signatures[0], expected.w_rid);
    }

    #[test]
    fn merge_query_drops_signature_keys_from_params() {
        let base = Url::parse("https://api.bilibili.com/x/web-interface/wbi/view?w_rid=old").unwrap();
        let merged = merge_query(&base, &params(&[("bvid", "BV17x411w7KC"), (TIMESTAMP_KEY, "1")]));
        assert_eq!(merged, params(&[("bvid", "BV17x411w7KC")]));
    }
}
