//! Time source used for timestamps and "today".

use chrono::{DateTime, Duration, Local, TimeZone};
use std::sync::Mutex;

use crate::Day;

/// Source of the current local time (allows pinning time in tests)
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;

    /// Milliseconds since the Unix epoch
    fn now_millis(&self) -> i64 {
        self.now().timestamp_millis()
    }

    /// The weekday column that counts as today
    fn today(&self) -> Day {
        Day::of_date(&self.now())
    }
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Local>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Local>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Clock pinned to local noon on the given date
    pub fn at_date(year: i32, month: u32, day: u32) -> Option<Self> {
        Local
            .with_ymd_and_hms(year, month, day, 12, 0, 0)
            .single()
            .map(Self::new)
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Local> {
        *self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_today_follows_advance() {
        // 2024-01-03 was a Wednesday
        let clock = ManualClock::at_date(2024, 1, 3).unwrap();
        assert_eq!(clock.today(), Day::Wednesday);

        let before = clock.now_millis();
        clock.advance(Duration::days(2));
        assert_eq!(clock.today(), Day::Friday);
        assert_eq!(clock.now_millis() - before, 2 * 24 * 60 * 60 * 1000);
    }
}
