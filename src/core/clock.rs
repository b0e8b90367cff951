//! Time source for every persisted timestamp.
//!
//! Services never call `Utc::now()` directly; they hold an `Arc<dyn Clock>`
//! so tests can pin time with [`FixedClock`].

use chrono::{DateTime, Utc};
use std::sync::{Arc, RwLock};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock used in production
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to a settable instant
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct FixedClock {
    instant: Arc<RwLock<DateTime<Utc>>>,
}

#[allow(dead_code)]
impl FixedClock {
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self {
            instant: Arc::new(RwLock::new(instant)),
        }
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        if let Ok(mut guard) = self.instant.write() {
            *guard = instant;
        }
    }

    pub fn advance(&self, by: chrono::Duration) {
        if let Ok(mut guard) = self.instant.write() {
            *guard += by;
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        match self.instant.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_fixed_clock_returns_pinned_instant() {
        let instant = Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0).unwrap();
        let clock = FixedClock::new(instant);
        assert_eq!(clock.now(), instant);
        assert_eq!(clock.now(), instant);
    }

    #[test]
    fn test_fixed_clock_advance_and_set() {
        let instant = Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0).unwrap();
        let clock = FixedClock::new(instant);

        clock.advance(chrono::Duration::minutes(5));
        assert_eq!(
            clock.now(),
            Utc.with_ymd_and_hms(2025, 3, 14, 9, 35, 0).unwrap()
        );

        let later = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        clock.set(later);
        assert_eq!(clock.now(), later);
    }

    #[test]
    fn test_clones_share_the_same_instant() {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
        let shared: Arc<dyn Clock> = Arc::new(clock.clone());

        clock.advance(chrono::Duration::hours(1));
        assert_eq!(
            shared.now(),
            Utc.with_ymd_and_hms(2025, 1, 1, 1, 0, 0).unwrap()
        );
    }
}
