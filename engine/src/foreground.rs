//! Foreground/background tracking with a trailing grace window.
//!
//! Screen rotation and quick app switches flip the flag off and on within a
//! second or two. Readers that care (e.g. whether to notify or run a command
//! promptly) should not see those blips, so after going to background the app
//! still counts as foreground until the grace window has passed.

use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

#[derive(Debug, Default, Clone, Copy)]
struct ForegroundFlag {
    in_foreground: bool,
    changed_at: Option<Instant>,
}

/// Shared by every [`AppContext`](crate::AppContext) built by one holder, so
/// the flag survives context re-creation.
#[derive(Debug)]
pub struct ForegroundTracker {
    grace: Duration,
    flag: Mutex<ForegroundFlag>,
}

impl ForegroundTracker {
    #[must_use]
    pub fn new(grace: Duration) -> Self {
        Self {
            grace,
            flag: Mutex::new(ForegroundFlag::default()),
        }
    }

    #[must_use]
    pub fn grace(&self) -> Duration {
        self.grace
    }

    pub fn set_in_foreground(&self, in_foreground: bool) {
        self.set_in_foreground_at(in_foreground, Instant::now());
    }

    /// The transition time only moves when the value actually changes.
    pub fn set_in_foreground_at(&self, in_foreground: bool, now: Instant) {
        let mut flag = self.flag.lock().unwrap_or_else(PoisonError::into_inner);
        if flag.in_foreground != in_foreground {
            flag.changed_at = Some(now);
            tracing::debug!(in_foreground, "Foreground state changed");
        }
        flag.in_foreground = in_foreground;
    }

    #[must_use]
    pub fn is_in_foreground(&self) -> bool {
        self.is_in_foreground_at(Instant::now())
    }

    #[must_use]
    pub fn is_in_foreground_at(&self, now: Instant) -> bool {
        let flag = *self.flag.lock().unwrap_or_else(PoisonError::into_inner);
        if flag.in_foreground {
            return true;
        }
        flag.changed_at
            .is_some_and(|changed| now.saturating_duration_since(changed) < self.grace)
    }
}
