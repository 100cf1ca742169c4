//! Time source of the ledger.
//!
//! The ledger trusts whatever the clock says: cooldowns and interest are only as good as
//! the host's notion of time.

use std::cell::Cell;
use std::rc::Rc;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use crate::units::Timestamp;

pub trait Clock {
    fn now(&self) -> Timestamp;
}

/// Wall clock, seconds since the Unix epoch.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        // A host clock set before 1970 is treated as the epoch itself.
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_secs());
        Timestamp(secs)
    }
}

/// Settable clock whose clones share the same instant.
///
/// Used to replay timestamped commands and to drive time in tests.
#[derive(Debug, Default, Clone)]
pub struct ManualClock(Rc<Cell<Timestamp>>);

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self(Rc::new(Cell::new(start)))
    }

    pub fn set(&self, now: Timestamp) {
        self.0.set(now);
    }

    pub fn advance(&self, secs: u64) {
        self.0.set(self.0.get().saturating_add_secs(secs));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.0.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::new(Timestamp(10));
        let handle = clock.clone();

        handle.set(Timestamp(20));
        assert_eq!(clock.now(), Timestamp(20));

        clock.advance(5);
        assert_eq!(handle.now(), Timestamp(25));
    }

    #[test]
    fn system_clock_is_past_the_epoch() {
        assert!(SystemClock.now() > Timestamp(0));
    }
}
