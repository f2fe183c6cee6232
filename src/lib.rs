//! # bilisign-rs
//!
//! Client-side access layer for Bilibili's private web APIs.
//!
//! The origin guards its endpoints with a WBI request signature, browser
//! fingerprint checks and risk-control rejections (`code: -352`). This crate
//! bundles what a scraper needs to keep getting answers:
//!
//! - av/BV identifier conversion ([`codec`])
//! - WBI mixin key retrieval and request signing ([`signing`])
//! - a forged browser identity that can be swapped in one step ([`device`])
//! - a retrying requester that rotates the identity on every rejection and
//!   flips the preferred API surface once its attempt budget is spent
//!
//! ## Example
//!
//! ```no_run
//! use std::collections::BTreeMap;
//!
//! use bilisign_rs::{ResilientRequester, codec};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let requester = ResilientRequester::new()?;
//!     let mut params = BTreeMap::new();
//!     params.insert("mid".to_string(), "2".to_string());
//!     let envelope = requester
//!         .fetch("https://api.bilibili.com/x/space/wbi/acc/info", &params)
//!         .await?;
//!     println!("{}", envelope.payload());
//!     println!("{}", codec::encode(170001)?);
//!     Ok(())
//! }
//! ```

mod requester;

pub mod codec;
pub mod device;
pub mod envelope;
pub mod events;
pub mod signing;
pub mod surface;
pub mod transport;

pub use crate::requester::{
    AccessError,
    AccessResult,
    DEFAULT_MAX_ATTEMPTS,
    RequesterBuilder,
    RequesterConfig,
    ResilientRequester,
};

pub use crate::codec::{CodecError, CodecResult};
pub use crate::device::{Device, DeviceForge};
pub use crate::envelope::{Envelope, RISK_CONTROL_CODE, SUCCESS_CODE};
pub use crate::events::{AccessEvent, EventDispatcher, EventHandler, LoggingHandler};
pub use crate::signing::{MixinKeyResolver, SigningError, WbiSignature};
pub use crate::surface::{Surface, SurfacePreference};
pub use crate::transport::{ReqwestTransport, Transport, TransportError, TransportResponse};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
