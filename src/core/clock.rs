//! Injectable sleep abstraction for the poll loop.
//!
//! The loop's only notion of time is "wait this long"; routing it through
//! a trait lets tests advance without real delays.

use async_trait::async_trait;
use std::time::Duration;

/// Async sleep provider.
#[async_trait]
pub trait Clock: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Production clock backed by the Tokio timer.
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Test clock that records requested sleeps and returns immediately.
#[derive(Default)]
pub struct NoopClock {
    sleeps: std::sync::Mutex<Vec<Duration>>,
}

impl NoopClock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every duration the loop has asked to sleep for, in order.
    #[must_use]
    pub fn recorded(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

#[async_trait]
impl Clock for NoopClock {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}
