//! Time sources for the engine.
//!
//! The engine never reads the system clock directly; it asks a [`Clock`].
//! The binary uses [`SystemClock`] unless a logical "now" is configured, and
//! replays and tests drive a [`ManualClock`].

use crate::ts::Instant;
use chrono::Utc;
use std::cell::Cell;
use std::rc::Rc;

pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Utc::now()
    }
}

/// Shared, settable clock. Clones observe the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Rc<Cell<Instant>>,
}

impl ManualClock {
    pub fn new(start: Instant) -> Self {
        Self {
            now: Rc::new(Cell::new(start)),
        }
    }

    pub fn set(&self, at: Instant) {
        self.now.set(at);
    }

    pub fn advance(&self, by: chrono::Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ts::{hours, parse_instant};

    #[test]
    fn clones_share_time() {
        let a = ManualClock::new(parse_instant("2026-01-31T00:00:00Z", "at").unwrap());
        let b = a.clone();
        a.advance(hours(5));
        assert_eq!(b.now(), parse_instant("2026-01-31T05:00:00Z", "at").unwrap());
    }
}
