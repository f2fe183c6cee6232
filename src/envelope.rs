//! JSON response envelope shared by every private API endpoint.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// `code` value signalling success.
pub const SUCCESS_CODE: i64 = 0;
/// `code` value the origin uses when risk control rejected the request.
pub const RISK_CONTROL_CODE: i64 = -352;

/// `{"code": .., "message": .., "ttl": .., "data" | "result": ..}`.
///
/// Only `code` is mandatory; a null or oddly typed `message` or `ttl` reads
/// as empty.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Envelope {
    pub code: i64,
    #[serde(default, deserialize_with = "lenient_message")]
    pub message: String,
    #[serde(default, deserialize_with = "lenient_ttl")]
    pub ttl: Option<i64>,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub result: Value,
}

impl Envelope {
    /// Parse a raw body. Anything without a numeric `code` is rejected.
    pub fn parse(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(body)
    }

    /// Success against the platform-wide sentinel `0`.
    pub fn is_success(&self) -> bool {
        self.succeeded_with(SUCCESS_CODE)
    }

    /// Success against a caller-chosen sentinel, as configured on the requester.
    pub fn succeeded_with(&self, success_code: i64) -> bool {
        self.code == success_code
    }

    pub fn is_risk_control(&self) -> bool {
        self.code == RISK_CONTROL_CODE
    }

    /// Payload under `data`, or `result` for the few endpoints that use it.
    pub fn payload(&self) -> &Value {
        if self.data.is_null() { &self.result } else { &self.data }
    }
}

fn lenient_message<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(message) => message,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

fn lenient_ttl<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Value::deserialize(deserializer)?.as_i64())
}
