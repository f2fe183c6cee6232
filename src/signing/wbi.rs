//! Pure signature computation.
//!
//! `w_rid = md5(sorted_query(params ∪ {wts}) ++ mixin_key)`; everything in
//! here is deterministic so it can be tested without a network.

use std::collections::BTreeMap;

use md5::{Digest, Md5};
use url::form_urlencoded::byte_serialize;

/// Query key carrying the signing timestamp.
pub const TIMESTAMP_KEY: &str = "wts";
/// Query key carrying the signature.
pub const SIGNATURE_KEY: &str = "w_rid";

/// Signature plus the timestamp that went into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WbiSignature {
    pub w_rid: String,
    pub wts: i64,
}

impl WbiSignature {
    /// The two query pairs to append to the request.
    pub fn query_pairs(&self) -> [(&'static str, String); 2] {
        [
            (SIGNATURE_KEY, self.w_rid.clone()),
            (TIMESTAMP_KEY, self.wts.to_string()),
        ]
    }
}

/// Sign `params` with an already-derived mixin key at a fixed timestamp.
///
/// Any caller-supplied `wts` is overwritten.
pub fn sign_with_key<'a, I>(params: I, mixin_key: &str, wts: i64) -> WbiSignature
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let wts_value = wts.to_string();
    let mut sorted: BTreeMap<&str, &str> = BTreeMap::new();
    for (key, value) in params {
        sorted.insert(key, value);
    }
    sorted.insert(TIMESTAMP_KEY, &wts_value);

    let mut payload = canonical_query(&sorted);
    payload.push_str(mixin_key);

    let digest = Md5::digest(payload.as_bytes());
    WbiSignature {
        w_rid: hex(&digest),
        wts,
    }
}

/// `k=v&k=v` in key order, both sides percent-encoded with `%20` for spaces.
pub fn canonical_query(sorted: &BTreeMap<&str, &str>) -> String {
    sorted
        .iter()
        .map(|(key, value)| format!("{}={}", encode_component(key), encode_component(value)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Form-style encoding (`*-._` kept) with `+` rewritten to `%20`.
pub fn encode_component(raw: &str) -> String {
    byte_serialize(raw.as_bytes()).collect::<String>().replace('+', "%20")
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
