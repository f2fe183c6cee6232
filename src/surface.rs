//! Sticky preference between the two interchangeable API surfaces.
//!
//! The requester only ever flips the flag after a call exhausts its attempt
//! budget; URL-building code elsewhere reads it to decide which endpoint to
//! target next.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use once_cell::sync::Lazy;

static GLOBAL_PREFERENCE: Lazy<Arc<SurfacePreference>> =
    Lazy::new(|| Arc::new(SurfacePreference::new()));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Surface {
    Primary,
    Secondary,
}

impl Surface {
    pub fn other(self) -> Self {
        match self {
            Surface::Primary => Surface::Secondary,
            Surface::Secondary => Surface::Primary,
        }
    }

    /// Pick the endpoint matching this surface.
    pub fn select<T>(self, primary: T, secondary: T) -> T {
        match self {
            Surface::Primary => primary,
            Surface::Secondary => secondary,
        }
    }
}

/// Thread-safe single-value store for the preferred surface.
#[derive(Debug, Default)]
pub struct SurfacePreference {
    secondary: AtomicBool,
    flips: AtomicUsize,
}

impl SurfacePreference {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_with(surface: Surface) -> Self {
        Self {
            secondary: AtomicBool::new(surface == Surface::Secondary),
            flips: AtomicUsize::new(0),
        }
    }

    /// Process-wide flag shared by every requester that is not given its own.
    pub fn global() -> Arc<SurfacePreference> {
        GLOBAL_PREFERENCE.clone()
    }

    pub fn current(&self) -> Surface {
        if self.secondary.load(Ordering::Acquire) {
            Surface::Secondary
        } else {
            Surface::Primary
        }
    }

    /// Switch to the other surface and return the new preference.
    pub fn flip(&self) -> Surface {
        let was_secondary = self.secondary.fetch_xor(true, Ordering::AcqRel);
        self.flips.fetch_add(1, Ordering::Relaxed);
        let now = if was_secondary { Surface::Primary } else { Surface::Secondary };
        log::info!("preferred API surface is now {now:?}");
        now
    }

    /// Number of flips since construction.
    pub fn flip_count(&self) -> usize {
        self.flips.load(Ordering::Relaxed)
    }
}
