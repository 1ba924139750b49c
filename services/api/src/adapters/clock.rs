//! services/api/src/adapters/clock.rs
//!
//! The production implementation of the `Clock` port.

use chrono::{DateTime, Utc};
use habit_tracker_core::ports::Clock;

/// Reads the operating system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
