//! Keep-alive deadlines
//!
//! Tracks the two deadlines the keep-alive supervisor compares against:
//! when the server is considered silent, and when the next ping is due.
//! Both are stored as milliseconds since an internal monotonic epoch so they
//! can be reset from the receive path and the send path without locking.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// What the supervisor should do on the current tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeepAliveAction {
    /// Both deadlines are in the future
    Idle,
    /// Nothing was sent for a keep-alive interval
    SendPing,
    /// Nothing was received for a server timeout
    ServerTimeout,
}

pub struct KeepAliveDeadlines {
    /// Epoch for converting Instant to u64
    epoch: Instant,
    /// Deadline for the next received payload (ms since epoch)
    next_server_timeout_ms: AtomicU64,
    /// Deadline for the next ping (ms since epoch)
    next_ping_ms: AtomicU64,
}

impl KeepAliveDeadlines {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
            next_server_timeout_ms: AtomicU64::new(u64::MAX),
            next_ping_ms: AtomicU64::new(u64::MAX),
        }
    }

    #[inline]
    fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    /// Call on every received payload
    pub fn reset_server_timeout(&self, server_timeout: Duration) {
        let deadline = self.now_ms().saturating_add(server_timeout.as_millis() as u64);
        self.next_server_timeout_ms.store(deadline, Ordering::Release);
    }

    /// Call on every sent payload
    pub fn reset_keep_alive(&self, keep_alive_interval: Duration) {
        let deadline = self.now_ms().saturating_add(keep_alive_interval.as_millis() as u64);
        self.next_ping_ms.store(deadline, Ordering::Release);
    }

    /// Compare both deadlines against the monotonic clock
    ///
    /// A server timeout takes precedence over a due ping.
    pub fn check(&self) -> KeepAliveAction {
        let now = self.now_ms();
        if now > self.next_server_timeout_ms.load(Ordering::Acquire) {
            return KeepAliveAction::ServerTimeout;
        }
        if now > self.next_ping_ms.load(Ordering::Acquire) {
            return KeepAliveAction::SendPing;
        }
        KeepAliveAction::Idle
    }
}

impl Default for KeepAliveDeadlines {
    fn default() -> Self {
        Self::new()
    }
}
