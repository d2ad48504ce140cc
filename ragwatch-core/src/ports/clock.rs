// ragwatch-core/src/ports/clock.rs

use chrono::{NaiveDateTime, NaiveTime, Utc};

pub trait Clock: Send + Sync {
    /// Current instant, naive UTC.
    fn now(&self) -> NaiveDateTime;

    /// Today at midnight, the reference date handed to RAG rules.
    fn today(&self) -> NaiveDateTime {
        self.now().date().and_time(NaiveTime::MIN)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Utc::now().naive_utc()
    }
}

/// Frozen clock for tests and replays.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}
