//! Fault-tolerant signed GET.
//!
//! Wires together the mixin key resolver, the device forge and the transport
//! to expose one primitive: fetch a signed endpoint, and when the origin
//! answers with anything but success, retry under a freshly forged identity
//! until the attempt budget runs out.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use http::HeaderMap;
use serde::Deserialize;
use thiserror::Error;
use tokio::time::sleep;
use url::Url;

use crate::codec::CodecError;
use crate::device::{DEFAULT_ACCEPT_LANGUAGE, Device, DeviceForge};
use crate::envelope::{Envelope, SUCCESS_CODE};
use crate::events::{
	AccessEvent, BlockedEvent, DeviceEvent, EventDispatcher, EventHandler, ExhaustedEvent,
	LoggingHandler, PostResponseEvent, PreRequestEvent,
};
use crate::signing::{DEFAULT_METADATA_URL, MixinKeyResolver, SigningError, merge_query};
use crate::surface::SurfacePreference;
use crate::transport::{ReqwestTransport, Transport, TransportError, TransportResponse};

/// Attempts per logical request before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 6;

/// Result alias used across the request layer.
pub type AccessResult<T> = Result<T, AccessError>;

/// High-level error surfaced to callers.
#[derive(Debug, Error)]
pub enum AccessError {
	#[error("identifier codec misuse: {0}")]
	Codec(#[from] CodecError),
	#[error("signing failed: {0}")]
	Signing(#[from] SigningError),
	#[error("transport failed: {0}")]
	Transport(#[from] TransportError),
	#[error("unrecognised response envelope: {source}")]
	Envelope {
		source: serde_json::Error,
		body: String,
	},
	#[error("url parse error: {0}")]
	Url(#[from] url::ParseError),
	#[error("header conversion failed: {0}")]
	InvalidHeader(String),
	#[error("origin refused {attempts} attempts; last device {device}; last body: {last_body}")]
	BlockExhausted {
		attempts: u32,
		device: String,
		last_body: String,
	},
}

/// Requester configuration. Deserializable so hosts can keep it next to
/// their own settings; missing fields take the defaults below.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RequesterConfig {
	pub metadata_url: String,
	pub max_attempts: u32,
	pub success_code: i64,
	pub retry_delay_ms: u64,
	pub attach_device_params: bool,
	pub key_cache_ttl_secs: Option<u64>,
	pub accept_language: String,
}

impl Default for RequesterConfig {
	fn default() -> Self {
		Self {
			metadata_url: DEFAULT_METADATA_URL.to_string(),
			max_attempts: DEFAULT_MAX_ATTEMPTS,
			success_code: SUCCESS_CODE,
			retry_delay_ms: 0,
			attach_device_params: true,
			key_cache_ttl_secs: None,
			accept_language: DEFAULT_ACCEPT_LANGUAGE.to_string(),
		}
	}
}

impl RequesterConfig {
	pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
		serde_json::from_str(raw)
	}

	pub fn retry_delay(&self) -> Duration {
		Duration::from_millis(self.retry_delay_ms)
	}
}

/// Fluent builder for [`ResilientRequester`].
pub struct RequesterBuilder {
	config: RequesterConfig,
	transport: Option<Arc<dyn Transport>>,
	devices: Option<Arc<DeviceForge>>,
	surface: Option<Arc<SurfacePreference>>,
	handlers: Vec<Arc<dyn EventHandler>>,
}

impl RequesterBuilder {
	pub fn new() -> Self {
		Self {
			config: RequesterConfig::default(),
			transport: None,
			devices: None,
			surface: None,
			handlers: Vec::new(),
		}
	}

	pub fn with_config(mut self, config: RequesterConfig) -> Self {
		self.config = config;
		self
	}

	pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
		self.transport = Some(transport);
		self
	}

	pub fn with_device_forge(mut self, devices: Arc<DeviceForge>) -> Self {
		self.devices = Some(devices);
		self
	}

	pub fn with_surface_preference(mut self, surface: Arc<SurfacePreference>) -> Self {
		self.surface = Some(surface);
		self
	}

	pub fn with_event_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
		self.handlers.push(handler);
		self
	}

	pub fn with_metadata_url(mut self, url: impl Into<String>) -> Self {
		self.config.metadata_url = url.into();
		self
	}

	pub fn with_max_attempts(mut self, attempts: u32) -> Self {
		self.config.max_attempts = attempts;
		self
	}

	pub fn with_success_code(mut self, code: i64) -> Self {
		self.config.success_code = code;
		self
	}

	pub fn with_retry_delay(mut self, delay: Duration) -> Self {
		self.config.retry_delay_ms = delay.as_millis().min(u64::MAX as u128) as u64;
		self
	}

	pub fn with_key_cache_ttl(mut self, ttl: Duration) -> Self {
		self.config.key_cache_ttl_secs = Some(ttl.as_secs());
		self
	}

	pub fn with_accept_language(mut self, value: impl Into<String>) -> Self {
		self.config.accept_language = value.into();
		self
	}

	pub fn disable_device_params(mut self) -> Self {
		self.config.attach_device_params = false;
		self
	}

	pub fn build(self) -> AccessResult<ResilientRequester> {
		ResilientRequester::from_parts(self)
	}
}

impl Default for RequesterBuilder {
	fn default() -> Self {
		Self::new()
	}
}

/// Signed, self-healing GET against the private APIs.
pub struct ResilientRequester {
	config: RequesterConfig,
	transport: Arc<dyn Transport>,
	resolver: MixinKeyResolver,
	devices: Arc<DeviceForge>,
	surface: Arc<SurfacePreference>,
	events: EventDispatcher,
}

impl ResilientRequester {
	/// Requester over reqwest sharing the process-wide device and surface flag.
	pub fn new() -> AccessResult<Self> {
		RequesterBuilder::new().build()
	}

	pub fn builder() -> RequesterBuilder {
		RequesterBuilder::new()
	}

	fn from_parts(builder: RequesterBuilder) -> AccessResult<Self> {
		let RequesterBuilder {
			mut config,
			transport,
			devices,
			surface,
			handlers,
		} = builder;
		config.max_attempts = config.max_attempts.max(1);

		let transport: Arc<dyn Transport> = match transport {
			Some(transport) => transport,
			None => Arc::new(ReqwestTransport::new()?),
		};

		let mut resolver =
			MixinKeyResolver::with_metadata_url(transport.clone(), Url::parse(&config.metadata_url)?);
		if let Some(ttl) = config.key_cache_ttl_secs {
			resolver = resolver.with_cache_ttl(Duration::from_secs(ttl));
		}

		let mut events = EventDispatcher::new();
		events.register_handler(Arc::new(LoggingHandler));
		for handler in handlers {
			events.register_handler(handler);
		}

		Ok(Self {
			config,
			transport,
			resolver,
			devices: devices.unwrap_or_else(DeviceForge::global),
			surface: surface.unwrap_or_else(SurfacePreference::global),
			events,
		})
	}

	pub fn config(&self) -> &RequesterConfig {
		&self.config
	}

	pub fn devices(&self) -> &Arc<DeviceForge> {
		&self.devices
	}

	pub fn surface(&self) -> &Arc<SurfacePreference> {
		&self.surface
	}

	/// Live forged identity, for callers attaching it to unsigned requests.
	pub fn current_device(&self) -> Arc<Device> {
		self.devices.current()
	}

	/// Signed GET of `base_url` with `params`.
	pub async fn fetch(
		&self,
		base_url: &str,
		params: &BTreeMap<String, String>,
	) -> AccessResult<Envelope> {
		let base = Url::parse(base_url)?;
		self.fetch_url(&base, params).await
	}

	/// Same as [`fetch`](Self::fetch) with an already parsed URL.
	///
	/// Only a success envelope ends the loop early. Every other `code`
	/// (risk control or not) costs one attempt and a new device; signing,
	/// transport and envelope-shape failures abort immediately.
	pub async fn fetch_url(
		&self,
		base: &Url,
		params: &BTreeMap<String, String>,
	) -> AccessResult<Envelope> {
		let budget = self.config.max_attempts;
		let mut attempts_left = budget;
		let mut last_body = String::new();

		while attempts_left > 0 {
			let attempt = budget - attempts_left + 1;
			let device = self.devices.current();
			let (response, envelope) = self.attempt(base, params, &device, attempt).await?;

			if envelope.succeeded_with(self.config.success_code) {
				return Ok(envelope);
			}

			self.regenerate_device();
			attempts_left -= 1;
			self.events.dispatch(AccessEvent::Blocked(BlockedEvent {
				url: response.url.clone(),
				attempt,
				code: envelope.code,
				message: envelope.message.clone(),
				attempts_left,
				timestamp: chrono::Utc::now(),
			}));
			last_body = response.text();

			let delay = self.config.retry_delay();
			if attempts_left > 0 && delay > Duration::ZERO {
				sleep(delay).await;
			}
		}

		let device = self.regenerate_device();
		let surface = self.surface.flip();
		self.events.dispatch(AccessEvent::Exhausted(ExhaustedEvent {
			url: base.clone(),
			attempts: budget,
			surface,
			device: device.info(),
			timestamp: chrono::Utc::now(),
		}));

		Err(AccessError::BlockExhausted {
			attempts: budget,
			device: device.info(),
			last_body,
		})
	}

	async fn attempt(
		&self,
		base: &Url,
		params: &BTreeMap<String, String>,
		device: &Device,
		attempt: u32,
	) -> AccessResult<(TransportResponse, Envelope)> {
		let metadata_headers = self.headers_for(device, self.resolver.metadata_url())?;
		let mut signed_params = merge_query(base, params);
		if self.config.attach_device_params {
			let mut rng = rand::thread_rng();
			for (key, value) in device.dm_img_params(&mut rng) {
				signed_params.entry(key).or_insert(value);
			}
		}

		let url = self
			.resolver
			.signed_url(base, &signed_params, &metadata_headers)
			.await?;
		let headers = self.headers_for(device, &url)?;

		self.events.dispatch(AccessEvent::PreRequest(PreRequestEvent {
			url: url.clone(),
			attempt,
			user_agent: device.user_agent().to_string(),
			timestamp: chrono::Utc::now(),
		}));

		let started = Instant::now();
		let response = self.transport.get(&url, &headers).await?;
		let latency = started.elapsed();

		let body = response.text();
		let envelope = Envelope::parse(&body)
			.map_err(|source| AccessError::Envelope { source, body })?;

		self.events.dispatch(AccessEvent::PostResponse(PostResponseEvent {
			url: response.url.clone(),
			status: response.status,
			code: envelope.code,
			latency,
			timestamp: chrono::Utc::now(),
		}));

		Ok((response, envelope))
	}

	fn regenerate_device(&self) -> Arc<Device> {
		let device = self.devices.regenerate();
		self.events.dispatch(AccessEvent::DeviceRegenerated(DeviceEvent {
			user_agent: device.user_agent().to_string(),
			renderer: device.renderer_info().to_string(),
			timestamp: chrono::Utc::now(),
		}));
		device
	}

	fn headers_for(&self, device: &Device, target: &Url) -> AccessResult<HeaderMap> {
		device
			.headers(target, &self.config.accept_language)
			.map_err(|err| AccessError::InvalidHeader(err.to_string()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn config_defaults_fill_missing_fields() {
		let config = RequesterConfig::from_json(r#"{"max_attempts":3,"retry_delay_ms":250}"#).unwrap();
		assert_eq!(config.max_attempts, 3);
		assert_eq!(config.retry_delay(), Duration::from_millis(250));
		assert_eq!(config.success_code, SUCCESS_CODE);
		assert_eq!(config.metadata_url, DEFAULT_METADATA_URL);
		assert!(config.attach_device_params);
	}

	#[test]
	fn default_budget_is_six() {
		assert_eq!(RequesterConfig::default().max_attempts, 6);
	}

	#[test]
	fn codec_errors_convert() {
		fn lookup(bvid: &str) -> AccessResult<u64> {
			Ok(crate::codec::decode(bvid)?)
		}
		assert_eq!(lookup("BV17x411w7KC").unwrap(), 170001);
		assert!(matches!(lookup("BV"), Err(AccessError::Codec(CodecError::InvalidLength(2)))));
	}

	#[test]
	fn block_exhausted_message_carries_context() {
		let err = AccessError::BlockExhausted {
			attempts: 6,
			device: "{UserAgent: ua}".into(),
			last_body: r#"{"code":-352}"#.into(),
		};
		let message = err.to_string();
		assert!(message.contains("6 attempts"));
		assert!(message.contains("{UserAgent: ua}"));
		assert!(message.contains("-352"));
	}
}
