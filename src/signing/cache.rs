//! Time-bounded mixin key cache.
//!
//! Fragments rotate server-side every few hours, so a short TTL only changes
//! request volume, never the produced signatures.

use chrono::{DateTime, Utc};
use std::sync::RwLock;
use std::time::Duration;

#[derive(Debug, Clone)]
struct CachedKey {
    mixin_key: String,
    fetched_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct MixinKeyCache {
    ttl: Duration,
    slot: RwLock<Option<CachedKey>>,
}

impl MixinKeyCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: RwLock::new(None),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached key if it is younger than the TTL at `now`.
    pub fn get_at(&self, now: DateTime<Utc>) -> Option<String> {
        let guard = self.slot.read().ok()?;
        let entry = guard.as_ref()?;
        let age = (now - entry.fetched_at).to_std().ok()?;
        (age < self.ttl).then(|| entry.mixin_key.clone())
    }

    pub fn get(&self) -> Option<String> {
        self.get_at(Utc::now())
    }

    pub fn store_at(&self, mixin_key: String, now: DateTime<Utc>) {
        if let Ok(mut guard) = self.slot.write() {
            *guard = Some(CachedKey {
                mixin_key,
                fetched_at: now,
            });
        }
    }

    pub fn store(&self, mixin_key: String) {
        self.store_at(mixin_key, Utc::now());
    }

    pub fn invalidate(&self) {
        if let Ok(mut guard) = self.slot.write() {
            *guard = None;
        }
    }
}
