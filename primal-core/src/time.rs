//! Wall-clock budget carrier.

use std::time::{Duration, Instant};

/// A start instant plus an optional deadline, passed by value to every
/// heuristic so each can terminate itself.
#[derive(Debug, Clone, Copy)]
pub struct TimeLimit {
    start: Instant,
    limit: Option<Duration>,
}

impl TimeLimit {
    /// Budget of `seconds` starting now; `None` means unlimited.
    pub fn new(seconds: Option<f64>) -> Self {
        Self {
            start: Instant::now(),
            limit: seconds.map(Duration::from_secs_f64),
        }
    }

    /// A limit that never expires.
    pub fn unlimited() -> Self {
        Self::new(None)
    }

    /// Time spent since the budget started.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Time left before the deadline; saturates at zero once it has passed
    /// and is `Duration::MAX` for an unlimited budget.
    pub fn remaining(&self) -> Duration {
        match self.limit {
            Some(limit) => limit.saturating_sub(self.start.elapsed()),
            None => Duration::MAX,
        }
    }

    /// Whether the deadline has passed.
    pub fn expired(&self) -> bool {
        match self.limit {
            Some(limit) => self.start.elapsed() >= limit,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_budget_expires_immediately() {
        let tl = TimeLimit::new(Some(0.0));
        assert!(tl.expired());
        assert_eq!(tl.remaining(), Duration::ZERO);
    }

    #[test]
    fn test_unlimited_never_expires() {
        let tl = TimeLimit::unlimited();
        assert!(!tl.expired());
        assert_eq!(tl.remaining(), Duration::MAX);
    }

    #[test]
    fn test_generous_budget_not_expired() {
        let tl = TimeLimit::new(Some(3600.0));
        assert!(!tl.expired());
        assert!(tl.elapsed() < Duration::from_secs(1));
        assert!(tl.remaining() > Duration::from_secs(3000));
    }
}
