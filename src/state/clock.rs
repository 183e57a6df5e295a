//! Wall-clock access, injectable so date-dependent rules are testable.

use std::sync::Mutex;

use time::{Date, OffsetDateTime, UtcOffset};
use tracing::warn;

/// Source of the current device-local time.
pub trait Clock: Send + Sync {
    /// Current instant in the device-local offset.
    fn now(&self) -> OffsetDateTime;

    /// Current device-local calendar day.
    fn today(&self) -> Date {
        self.now().date()
    }
}

/// System clock pinned to the local offset detected at startup.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: UtcOffset,
}

impl SystemClock {
    /// Detect the local offset. Must run before the async runtime spawns worker
    /// threads, otherwise the platform refuses to report it and UTC is used.
    pub fn detect() -> Self {
        let offset = match UtcOffset::current_local_offset() {
            Ok(offset) => offset,
            Err(err) => {
                warn!(error = %err, "cannot determine local UTC offset; falling back to UTC");
                UtcOffset::UTC
            }
        };
        Self { offset }
    }

    /// Clock using a fixed offset.
    pub fn with_offset(offset: UtcOffset) -> Self {
        Self { offset }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc().to_offset(self.offset)
    }
}

/// Manually driven clock.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<OffsetDateTime>,
}

impl FixedClock {
    /// Clock frozen at `now`.
    pub fn new(now: OffsetDateTime) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Move the clock to `now`.
    pub fn set(&self, now: OffsetDateTime) {
        if let Ok(mut guard) = self.now.lock() {
            *guard = now;
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        match self.now.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}
