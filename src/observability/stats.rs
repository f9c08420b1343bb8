//! Bridge statistics.
//!
//! Three monotonically increasing counters behind a single lock, so every
//! snapshot satisfies `requests >= good_forwards + bad_forwards`.

use std::fmt;
use std::sync::{Mutex, PoisonError};

/// Which counter to touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatKind {
    /// Requests seen on `/addresses`, whatever their outcome.
    Requests,
    /// Submissions published to the broker.
    GoodForwards,
    /// Submissions the broker did not accept.
    BadForwards,
}

/// A consistent read of all three counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatSnapshot {
    pub requests: u64,
    pub good_forwards: u64,
    pub bad_forwards: u64,
}

impl fmt::Display for StatSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# of forward requests: {}", self.requests)?;
        writeln!(f, "# of successful forwards: {}", self.good_forwards)?;
        writeln!(f, "# of failed forwards: {}", self.bad_forwards)
    }
}

/// Thread-safe bridge counters.
#[derive(Debug, Default)]
pub struct StatCounters {
    inner: Mutex<StatSnapshot>,
}

impl StatCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment the given counter by one.
    pub fn increment(&self, kind: StatKind) {
        let mut stats = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        match kind {
            StatKind::Requests => stats.requests += 1,
            StatKind::GoodForwards => stats.good_forwards += 1,
            StatKind::BadForwards => stats.bad_forwards += 1,
        }
    }

    /// Read the given counter.
    pub fn read(&self, kind: StatKind) -> u64 {
        let stats = self.snapshot();
        match kind {
            StatKind::Requests => stats.requests,
            StatKind::GoodForwards => stats.good_forwards,
            StatKind::BadForwards => stats.bad_forwards,
        }
    }

    /// Read all counters under one lock acquisition.
    pub fn snapshot(&self) -> StatSnapshot {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn counters_start_at_zero() {
        let stats = StatCounters::new();
        assert_eq!(stats.snapshot(), StatSnapshot::default());
    }

    #[test]
    fn increment_touches_only_its_counter() {
        let stats = StatCounters::new();
        stats.increment(StatKind::Requests);
        stats.increment(StatKind::Requests);
        stats.increment(StatKind::BadForwards);

        assert_eq!(stats.read(StatKind::Requests), 2);
        assert_eq!(stats.read(StatKind::GoodForwards), 0);
        assert_eq!(stats.read(StatKind::BadForwards), 1);
    }

    #[test]
    fn concurrent_increments_are_not_lost() {
        let stats = Arc::new(StatCounters::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let stats = Arc::clone(&stats);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        stats.increment(StatKind::Requests);
                        stats.increment(StatKind::GoodForwards);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.requests, 8000);
        assert_eq!(snapshot.good_forwards, 8000);
        assert_eq!(snapshot.bad_forwards, 0);
    }

    #[test]
    fn report_has_three_lines_in_order() {
        let snapshot = StatSnapshot {
            requests: 3,
            good_forwards: 2,
            bad_forwards: 1,
        };
        assert_eq!(
            snapshot.to_string(),
            "# of forward requests: 3\n# of successful forwards: 2\n# of failed forwards: 1\n"
        );
    }
}
