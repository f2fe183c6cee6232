//! Key-fragment extraction and mixin key derivation.

use once_cell::sync::Lazy;
use regex::Regex;

use super::SigningError;

/// Index permutation applied to `img_key + sub_key`.
const MIXIN_KEY_ENC_TAB: [usize; 64] = [
    46, 47, 18, 2, 53, 8, 23, 32, 15, 50, 10, 31, 58, 3, 45, 35, 27, 43, 5, 49, 33, 9, 42, 19, 29,
    28, 14, 39, 12, 38, 41, 13, 37, 48, 7, 16, 24, 55, 40, 61, 26, 17, 0, 1, 60, 51, 30, 4, 22, 25,
    54, 21, 56, 59, 6, 63, 57, 62, 11, 36, 20, 34, 44, 52,
];

/// Combined length of both fragments.
pub const RAW_KEY_LEN: usize = 64;
/// Length of the derived mixin key.
pub const MIXIN_KEY_LEN: usize = 32;

static IMG_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""img_url"\s*:\s*"([^"]+)""#).expect("invalid img_url regex")
});
static SUB_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""sub_url"\s*:\s*"([^"]+)""#).expect("invalid sub_url regex")
});

/// The two rotating fragments published by the metadata endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyFragments {
    pub img_key: String,
    pub sub_key: String,
}

impl KeyFragments {
    pub fn new(img_key: impl Into<String>, sub_key: impl Into<String>) -> Self {
        Self {
            img_key: img_key.into(),
            sub_key: sub_key.into(),
        }
    }

    /// Pull both fragments out of a raw metadata body.
    pub fn from_body(body: &str) -> Result<Self, SigningError> {
        let img_url = capture(&IMG_URL_RE, body).ok_or(SigningError::MissingField("img_url"))?;
        let sub_url = capture(&SUB_URL_RE, body).ok_or(SigningError::MissingField("sub_url"))?;

        Ok(Self {
            img_key: file_stem(img_url).to_string(),
            sub_key: file_stem(sub_url).to_string(),
        })
    }

    /// Derive the 32-character mixin key.
    pub fn mixin_key(&self) -> Result<String, SigningError> {
        let raw: Vec<char> = self.img_key.chars().chain(self.sub_key.chars()).collect();
        if raw.len() != RAW_KEY_LEN {
            return Err(SigningError::MalformedKey(raw.len()));
        }

        Ok(MIXIN_KEY_ENC_TAB
            .iter()
            .take(MIXIN_KEY_LEN)
            .map(|&index| raw[index])
            .collect())
    }
}

fn capture<'a>(pattern: &Regex, body: &'a str) -> Option<&'a str> {
    pattern
        .captures(body)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Final path segment without its extension:
/// `https://i0.hdslb.com/bfs/wbi/7cd0….png` -> `7cd0…`.
fn file_stem(url: &str) -> &str {
    let segment = url.rsplit('/').next().unwrap_or(url);
    segment.split('.').next().unwrap_or(segment)
}

#[cfg(test)]
mod tests {
    use super::*;

    const IMG: &str = "7cd084941338484aae1ad9425b84077c";
    const SUB: &str = "4932caff0ff746eab6f01bf08b70ac45";

    #[test]
    fn derives_documented_mixin_key() {
        let fragments = KeyFragments::new(IMG, SUB);
        assert_eq!(fragments.mixin_key().unwrap(), "ea1db124af3c7062474693fa704f4ff8");
    }

    #[test]
    fn derivation_is_deterministic() {
        let fragments = KeyFragments::new(IMG, SUB);
        let first = fragments.mixin_key().unwrap();
        for _ in 0..16 {
            assert_eq!(fragments.mixin_key().unwrap(), first);
        }
        assert_eq!(first.len(), MIXIN_KEY_LEN);
    }

    #[test]
    fn extracts_fragments_from_nav_body() {
        let body = format!(
            r#"{{"code":-101,"message":"账号未登录","data":{{"isLogin":false,"wbi_img":{{"img_url":"https://i0.hdslb.com/bfs/wbi/{IMG}.png","sub_url":"https://i0.hdslb.com/bfs/wbi/{SUB}.png"}}}}}}"#
        );
        let fragments = KeyFragments::from_body(&body).unwrap();
        assert_eq!(fragments, KeyFragments::new(IMG, SUB));
    }

    #[test]
    fn tolerates_escaped_slashes() {
        let body = format!(
            r#"{{"wbi_img":{{"img_url":"https:\/\/i0.hdslb.com\/bfs\/wbi\/{IMG}.png","sub_url":"https:\/\/i0.hdslb.com\/bfs\/wbi\/{SUB}.png"}}}}"#
        );
        let fragments = KeyFragments::from_body(&body).unwrap();
        assert_eq!(fragments.img_key, IMG);
        assert_eq!(fragments.sub_key, SUB);
    }

    #[test]
    fn missing_field_is_reported() {
        let body = r#"{"wbi_img":{"img_url":"https://i0.hdslb.com/bfs/wbi/abc.png"}}"#;
        assert!(matches!(
            KeyFragments::from_body(body),
            Err(SigningError::MissingField("sub_url"))
        ));
    }

    #[test]
    fn short_fragments_are_rejected() {
        let fragments = KeyFragments::new("abc", "def");
        assert!(matches!(fragments.mixin_key(), Err(SigningError::MalformedKey(6))));
    }
}
