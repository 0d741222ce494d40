//! Fixed-window rate limiting for the credential endpoints.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};

/// Attempts allowed per window by default.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 30;

/// Default window length in seconds.
pub const DEFAULT_WINDOW_SECS: i64 = 60;

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    resets_at: DateTime<Utc>,
}

/// In-process fixed-window counter keyed by caller-chosen strings.
///
/// The first attempt of a window (or any attempt after the previous window
/// lapsed) starts a fresh count; once the count reaches the maximum, further
/// attempts are refused until the window resets. Time comes from the caller
/// so tests stay deterministic.
#[derive(Debug)]
pub struct RateLimiter {
    max_attempts: u32,
    window: Duration,
    windows: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(max_attempts: u32, window: Duration) -> Self {
        Self {
            max_attempts,
            window,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Records an attempt for `key` and reports whether it is allowed.
    pub fn check(&self, key: &str, now: DateTime<Utc>) -> bool {
        let mut windows = self
            .windows
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match windows.get_mut(key) {
            Some(window) if now <= window.resets_at => {
                if window.count >= self.max_attempts {
                    return false;
                }
                window.count += 1;
                true
            }
            _ => {
                windows.insert(
                    key.to_string(),
                    Window {
                        count: 1,
                        resets_at: now + self.window,
                    },
                );
                true
            }
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, Duration::seconds(DEFAULT_WINDOW_SECS))
    }
}
