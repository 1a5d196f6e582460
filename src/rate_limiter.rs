// Per-caller sliding-window rate limiter (in-process only).

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Key shared by every caller whose address is unknown. All such callers draw
/// from one budget; this is a known simplification, not an accident.
pub const UNKNOWN_CLIENT_KEY: &str = "unknown";

/// Admits at most `max_requests` per `window` for each key.
///
/// State lives in this process only and is lost on restart. Running several
/// instances multiplies the effective budget.
pub struct RateLimiter {
    window: Duration,
    max_requests: usize,
    state: Mutex<LimiterState>,
}

#[derive(Default)]
struct LimiterState {
    requests: HashMap<String, VecDeque<Instant>>,
    last_cleanup: Option<Instant>,
}

impl LimiterState {
    /// Forget keys whose newest admission is at or before `window_start`.
    fn drop_idle(&mut self, window_start: Instant, now: Instant) {
        self.requests
            .retain(|_, ts| ts.back().is_some_and(|t| *t > window_start));
        self.last_cleanup = Some(now);
    }
}

impl RateLimiter {
    pub fn new(window: Duration, max_requests: usize) -> Self {
        Self {
            window,
            max_requests,
            state: Mutex::new(LimiterState::default()),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn max_requests(&self) -> usize {
        self.max_requests
    }

    /// Admit-or-reject for `key` at the current instant.
    pub fn check(&self, key: &str) -> bool {
        self.check_at(key, Instant::now())
    }

    /// Admit-or-reject for `key` as if called at `now`.
    ///
    /// Timestamps at or before `now - window` are dropped first. A rejection
    /// records nothing, so rejected callers do not extend their own lockout.
    /// At most once per window, idle keys of every caller are dropped too.
    pub fn check_at(&self, key: &str, now: Instant) -> bool {
        // A poisoned lock still holds consistent timestamps.
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let window_start = now.checked_sub(self.window);
        if let Some(window_start) = window_start {
            let cleanup_due = state
                .last_cleanup
                .is_none_or(|last| now.saturating_duration_since(last) >= self.window);
            if cleanup_due {
                state.drop_idle(window_start, now);
            }
        }

        let timestamps = state.requests.entry(key.to_owned()).or_default();
        if let Some(window_start) = window_start {
            while timestamps.front().is_some_and(|t| *t <= window_start) {
                timestamps.pop_front();
            }
        }

        if timestamps.len() >= self.max_requests {
            return false;
        }
        timestamps.push_back(now);
        true
    }

    /// Drop every key with no admission inside the window ending at `now`.
    pub fn cleanup_at(&self, now: Instant) {
        let Some(window_start) = now.checked_sub(self.window) else {
            return;
        };
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .drop_idle(window_start, now);
    }

    /// Timestamps currently held for `key` (expired ones included until the next check).
    pub fn tracked(&self, key: &str) -> usize {
        let state = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        state.requests.get(key).map_or(0, VecDeque::len)
    }

    /// Number of keys currently held.
    pub fn tracked_keys(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .requests
            .len()
    }
}
