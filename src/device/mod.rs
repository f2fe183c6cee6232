//! Synthetic browser identity.
//!
//! A [`Device`] is a forged Windows Chrome fingerprint: user-agent, WebGL
//! version, ANGLE renderer string and viewport. [`DeviceForge`] keeps exactly
//! one live device and swaps it wholesale on regeneration, so every reader
//! sees either the old or the new identity, never a mix of both.

pub mod catalog;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use http::header::{ACCEPT_LANGUAGE, HeaderMap, HeaderValue, InvalidHeaderValue, REFERER, USER_AGENT};
use once_cell::sync::Lazy;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use url::Url;

use catalog::GRAPHIC_CARDS;

const WINDOWS_PLATFORM: &str = "Windows NT 10.0; Win64; x64";
const CHROMIUM_WEBGL_VERSION: &str = "WebGL 1.0 (OpenGL ES 2.0 Chromium)";
/// Sampled Chrome majors, `[MIN, MAX)`.
const CHROME_MAJOR_MIN: u32 = 130;
const CHROME_MAJOR_MAX: u32 = 138;

pub const WWW_REFERER: &str = "https://www.bilibili.com/";
pub const SPACE_REFERER: &str = "https://space.bilibili.com/";
pub const LIVE_REFERER: &str = "https://live.bilibili.com/";
pub const DEFAULT_ACCEPT_LANGUAGE: &str = "zh-CN,zh;q=0.9";

static GLOBAL_FORGE: Lazy<Arc<DeviceForge>> = Lazy::new(|| Arc::new(DeviceForge::new()));

/// Immutable forged identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    user_agent: String,
    chrome_major: u32,
    webgl_version: String,
    webgl_version_b64: String,
    renderer_info: String,
    renderer_info_b64: String,
    inner_width: u32,
    inner_height: u32,
}

impl Device {
    pub fn new(
        chrome_major: u32,
        webgl_version: impl Into<String>,
        renderer_info: impl Into<String>,
        inner_width: u32,
        inner_height: u32,
    ) -> Self {
        let webgl_version = webgl_version.into();
        let renderer_info = renderer_info.into();
        Self {
            user_agent: build_user_agent(WINDOWS_PLATFORM, chrome_major),
            chrome_major,
            webgl_version_b64: encode_truncated(&webgl_version),
            webgl_version,
            renderer_info_b64: encode_truncated(&renderer_info),
            renderer_info,
            inner_width,
            inner_height,
        }
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn chrome_major(&self) -> u32 {
        self.chrome_major
    }

    pub fn webgl_version(&self) -> &str {
        &self.webgl_version
    }

    /// WebGL version in its transmitted form.
    pub fn webgl_version_b64(&self) -> &str {
        &self.webgl_version_b64
    }

    pub fn renderer_info(&self) -> &str {
        &self.renderer_info
    }

    /// Renderer string in its transmitted form.
    pub fn renderer_info_b64(&self) -> &str {
        &self.renderer_info_b64
    }

    pub fn inner_width(&self) -> u32 {
        self.inner_width
    }

    pub fn inner_height(&self) -> u32 {
        self.inner_height
    }

    /// One-line description used in diagnostics.
    pub fn info(&self) -> String {
        format!(
            "{{UserAgent: {}, WebGlVersion: {}, WebGLRendererInfo: {}}}",
            self.user_agent, self.webgl_version, self.renderer_info
        )
    }

    /// Identity headers for a request to `target`.
    ///
    /// The referer follows the target host when it is one of the known
    /// front-ends and falls back to the main site otherwise.
    pub fn headers(&self, target: &Url, accept_language: &str) -> Result<HeaderMap, InvalidHeaderValue> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_str(&self.user_agent)?);
        headers.insert(REFERER, HeaderValue::from_static(referer_for(target)));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_str(accept_language)?);
        Ok(headers)
    }

    /// `dm_img_*` query parameters derived from this device.
    pub fn dm_img_params<R: Rng + ?Sized>(&self, rng: &mut R) -> BTreeMap<String, String> {
        let width = i64::from(self.inner_width);
        let height = i64::from(self.inner_height);

        let wh_rnd: i64 = rng.gen_range(0..114);
        let wh = [2 * width + 2 * height + 3 * wh_rnd, 4 * width - height + wh_rnd, wh_rnd];

        // Page is never scrolled, so scrollTop and scrollLeft are both zero.
        let of_rnd: i64 = rng.gen_range(0..514);
        let of = [of_rnd, 2 * of_rnd, of_rnd];

        let mut params = BTreeMap::new();
        params.insert("dm_img_list".to_string(), "[]".to_string());
        params.insert("dm_img_str".to_string(), self.webgl_version_b64.clone());
        params.insert("dm_cover_img_str".to_string(), self.renderer_info_b64.clone());
        params.insert(
            "dm_img_inter".to_string(),
            format!(
                r#"{{"ds":[],"wh":[{},{},{}],"of":[{},{},{}]}}"#,
                wh[0], wh[1], wh[2], of[0], of[1], of[2]
            ),
        );
        params
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.info())
    }
}

/// Holder of the live device.
///
/// Cheap to share behind an [`Arc`]; use [`DeviceForge::global`] for the
/// process-wide instance or build a private one for isolated callers/tests.
pub struct DeviceForge {
    current: RwLock<Option<Arc<Device>>>,
    rng: Mutex<StdRng>,
}

impl DeviceForge {
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Deterministic sampling for reproducible runs.
    pub fn seeded(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    /// Start from a fixed device instead of sampling one lazily.
    pub fn with_device(device: Device) -> Self {
        let forge = Self::new();
        forge.install(Arc::new(device));
        forge
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            current: RwLock::new(None),
            rng: Mutex::new(rng),
        }
    }

    /// Process-wide forge shared by every requester that is not given its own.
    pub fn global() -> Arc<DeviceForge> {
        GLOBAL_FORGE.clone()
    }

    /// Live device, forging one on first use.
    pub fn current(&self) -> Arc<Device> {
        if let Some(device) = self.peek() {
            return device;
        }
        self.regenerate()
    }

    /// Live device without forging.
    pub fn peek(&self) -> Option<Arc<Device>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Forge a fresh device and make it the live one.
    ///
    /// The new device never reuses the user-agent of the one it replaces.
    pub fn regenerate(&self) -> Arc<Device> {
        let previous = self.peek();
        let device = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::new(forge_device(&mut *rng, previous.as_deref()))
        };
        self.install(device.clone());
        log::debug!("forged device {}", device.user_agent());
        device
    }

    /// `dm_img_*` parameters for the live device.
    pub fn dm_img_params(&self) -> BTreeMap<String, String> {
        let device = self.current();
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        device.dm_img_params(&mut *rng)
    }

    /// Identity headers of the live device, for unsigned requests that should
    /// look like the same browser.
    pub fn identity_headers(&self, target: &Url) -> Result<HeaderMap, InvalidHeaderValue> {
        self.current().headers(target, DEFAULT_ACCEPT_LANGUAGE)
    }

    fn install(&self, device: Arc<Device>) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(device);
    }
}

impl Default for DeviceForge {
    fn default() -> Self {
        Self::new()
    }
}

fn forge_device<R: Rng + ?Sized>(rng: &mut R, previous: Option<&Device>) -> Device {
    let chrome_major = sample_chrome_major(rng, previous.map(Device::chrome_major));
    let (vendor, model) = GRAPHIC_CARDS
        .choose(rng)
        .copied()
        .unwrap_or(("NVIDIA", "NVIDIA GeForce RTX 3060 (0x00002504)"));

    Device::new(
        chrome_major,
        CHROMIUM_WEBGL_VERSION,
        build_angle_renderer_info(vendor, model),
        1920 - 60 - rng.gen_range(0..60),
        1080 - 90 - rng.gen_range(0..60),
    )
}

fn sample_chrome_major<R: Rng + ?Sized>(rng: &mut R, exclude: Option<u32>) -> u32 {
    match exclude {
        Some(previous) if (CHROME_MAJOR_MIN..CHROME_MAJOR_MAX).contains(&previous) => {
            let candidate = rng.gen_range(CHROME_MAJOR_MIN..CHROME_MAJOR_MAX - 1);
            if candidate >= previous { candidate + 1 } else { candidate }
        }
        _ => rng.gen_range(CHROME_MAJOR_MIN..CHROME_MAJOR_MAX),
    }
}

fn build_user_agent(platform: &str, chrome_major: u32) -> String {
    format!(
        "Mozilla/5.0 ({platform}) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/{chrome_major}.0.0.0 Safari/537.36"
    )
}

fn build_angle_renderer_info(vendor: &str, model: &str) -> String {
    format!("ANGLE ({vendor}, {model} Direct3D11 vs_5_0 ps_5_0, D3D11)Google Inc. ({vendor})")
}

/// Padded base64 minus its last two characters.
pub fn encode_truncated(raw: &str) -> String {
    let mut encoded = STANDARD.encode(raw.as_bytes());
    encoded.truncate(encoded.len().saturating_sub(2));
    encoded
}

fn referer_for(target: &Url) -> &'static str {
    match target.host_str() {
        Some("space.bilibili.com") => SPACE_REFERER,
        Some("live.bilibili.com") => LIVE_REFERER,
        _ => WWW_REFERER,
    }
}
