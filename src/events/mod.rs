//! Request lifecycle events.
//!
//! Provides hooks for logging and custom reactions around signed requests,
//! blocks, identity regeneration and budget exhaustion.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::surface::Surface;

/// Emitted right before a signed request leaves.
#[derive(Debug, Clone)]
pub struct PreRequestEvent {
    pub url: Url,
    pub attempt: u32,
    pub user_agent: String,
    pub timestamp: DateTime<Utc>,
}

/// Emitted once the envelope of a response was parsed.
#[derive(Debug, Clone)]
pub struct PostResponseEvent {
    pub url: Url,
    pub status: u16,
    pub code: i64,
    pub latency: Duration,
    pub timestamp: DateTime<Utc>,
}

/// Non-success envelope; the request will be retried with a new identity.
#[derive(Debug, Clone)]
pub struct BlockedEvent {
    pub url: Url,
    pub attempt: u32,
    pub code: i64,
    pub message: String,
    pub attempts_left: u32,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct DeviceEvent {
    pub user_agent: String,
    pub renderer: String,
    pub timestamp: DateTime<Utc>,
}

/// Attempt budget ran out; the preferred surface was flipped.
#[derive(Debug, Clone)]
pub struct ExhaustedEvent {
    pub url: Url,
    pub attempts: u32,
    pub surface: Surface,
    pub device: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub enum AccessEvent {
    PreRequest(PreRequestEvent),
    PostResponse(PostResponseEvent),
    Blocked(BlockedEvent),
    DeviceRegenerated(DeviceEvent),
    Exhausted(ExhaustedEvent),
}

/// Trait implemented by event handlers.
pub trait EventHandler: Send + Sync {
    fn handle(&self, event: &AccessEvent);
}

/// Dispatcher that broadcasts events to registered handlers.
#[derive(Default)]
pub struct EventDispatcher {
    handlers: Vec<Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self { handlers: Vec::new() }
    }

    pub fn register_handler(&mut self, handler: Arc<dyn EventHandler>) {
        self.handlers.push(handler);
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn dispatch(&self, event: AccessEvent) {
        for handler in &self.handlers {
            handler.handle(&event);
        }
    }
}

/// Logs events using the `log` crate.
#[derive(Debug)]
pub struct LoggingHandler;

impl EventHandler for LoggingHandler {
    fn handle(&self, event: &AccessEvent) {
        match event {
            AccessEvent::PreRequest(pre) => {
                log::debug!("-> GET {} (attempt {})", pre.url.path(), pre.attempt);
            }
            AccessEvent::PostResponse(post) => {
                log::debug!(
                    "<- {} {} code={} ({:.2}s)",
                    post.url.path(),
                    post.status,
                    post.code,
                    post.latency.as_secs_f64()
                );
            }
            AccessEvent::Blocked(blocked) => {
                log::info!(
                    "blocked {} attempt {} code={} ({}), {} left",
                    blocked.url.path(),
                    blocked.attempt,
                    blocked.code,
                    blocked.message,
                    blocked.attempts_left
                );
            }
            AccessEvent::DeviceRegenerated(device) => {
                log::debug!("new device {}", device.user_agent);
            }
            AccessEvent::Exhausted(exhausted) => {
                log::warn!(
                    "gave up on {} after {} attempts, now preferring {:?}; device {}",
                    exhausted.url.path(),
                    exhausted.attempts,
                    exhausted.surface,
                    exhausted.device
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingHandler(std::sync::Mutex<usize>);

    impl EventHandler for CountingHandler {
        fn handle(&self, _event: &AccessEvent) {
            *self.0.lock().unwrap() += 1;
        }
    }

    #[test]
    fn dispatches_to_handlers() {
        let mut dispatcher = EventDispatcher::new();
        let counter = Arc::new(CountingHandler(std::sync::Mutex::new(0)));
        dispatcher.register_handler(counter.clone());
        dispatcher.register_handler(Arc::new(LoggingHandler));
        dispatcher.dispatch(AccessEvent::DeviceRegenerated(DeviceEvent {
            user_agent: "ua".into(),
            renderer: "ANGLE".into(),
            timestamp: Utc::now(),
        }));
        assert_eq!(*counter.0.lock().unwrap(), 1);
        assert_eq!(dispatcher.len(), 2);
    }
}
