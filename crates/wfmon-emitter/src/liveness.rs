use std::time::{Duration, Instant};

/// Default window during which a probe result is trusted.
pub const DEFAULT_PROBE_TTL: Duration = Duration::from_secs(30);

/// Last known reachability of the monitor, trusted for `ttl`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LivenessCache {
    reachable: Option<bool>,
    checked_at: Option<Instant>,
    ttl: Duration,
}

impl Default for LivenessCache {
    fn default() -> Self {
        Self::new(DEFAULT_PROBE_TTL)
    }
}

impl LivenessCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            reachable: None,
            checked_at: None,
            ttl,
        }
    }

    /// Cached answer if it is still within the TTL window.
    pub fn cached(&self, now: Instant) -> Option<bool> {
        let checked_at = self.checked_at?;
        if now.saturating_duration_since(checked_at) < self.ttl {
            self.reachable
        } else {
            None
        }
    }

    pub fn record(&mut self, reachable: bool, now: Instant) {
        self.reachable = Some(reachable);
        self.checked_at = Some(now);
    }

    /// Mark the monitor unreachable after a hard connection failure.
    pub fn invalidate(&mut self, now: Instant) {
        self.record(false, now);
    }
}
