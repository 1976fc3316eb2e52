//! Refresh budget
//!
//! One request can only be retried once, but nothing stops a session from
//! expiring over and over (clock skew, a backend handing out already-expired
//! tokens). The budget caps refresh calls inside a sliding window; once it
//! is spent the failure is terminal.

use crate::config::RefreshBudgetConfig;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Sliding-window counter of refresh calls
#[derive(Debug)]
pub struct RefreshBudget {
    config: RefreshBudgetConfig,
    issued: Mutex<VecDeque<Instant>>,
}

impl RefreshBudget {
    pub fn new(config: RefreshBudgetConfig) -> Self {
        Self {
            config,
            issued: Mutex::new(VecDeque::new()),
        }
    }

    /// Record a refresh if the window has room for it
    pub fn try_acquire(&self) -> bool {
        self.try_acquire_at(Instant::now())
    }

    fn try_acquire_at(&self, now: Instant) -> bool {
        if !self.config.enabled {
            return true;
        }

        let mut issued = self.issued.lock();
        Self::evict(&mut issued, now, self.config.window);

        if issued.len() as u32 >= self.config.max_refreshes {
            warn!(
                max = self.config.max_refreshes,
                window_secs = self.config.window.as_secs(),
                "Refresh budget exhausted"
            );
            return false;
        }

        issued.push_back(now);
        debug!(
            used = issued.len(),
            max = self.config.max_refreshes,
            "Refresh budget: acquired"
        );
        true
    }

    /// Refreshes still available in the current window
    pub fn remaining(&self) -> u32 {
        if !self.config.enabled {
            return u32::MAX;
        }
        let mut issued = self.issued.lock();
        Self::evict(&mut issued, Instant::now(), self.config.window);
        self.config.max_refreshes.saturating_sub(issued.len() as u32)
    }

    /// Forget every recorded refresh (fresh login)
    pub fn reset(&self) {
        self.issued.lock().clear();
    }

    fn evict(issued: &mut VecDeque<Instant>, now: Instant, window: Duration) {
        while let Some(oldest) = issued.front() {
            if now.duration_since(*oldest) >= window {
                issued.pop_front();
            } else {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_limits_within_window() {
        let budget = RefreshBudget::new(RefreshBudgetConfig::new(2, Duration::from_secs(60)));
        let start = Instant::now();

        assert!(budget.try_acquire_at(start));
        assert!(budget.try_acquire_at(start + Duration::from_secs(1)));
        assert!(!budget.try_acquire_at(start + Duration::from_secs(2)));
    }

    #[test]
    fn test_budget_slides() {
        let budget = RefreshBudget::new(RefreshBudgetConfig::new(1, Duration::from_secs(10)));
        let start = Instant::now();

        assert!(budget.try_acquire_at(start));
        assert!(!budget.try_acquire_at(start + Duration::from_secs(9)));
        assert!(budget.try_acquire_at(start + Duration::from_secs(10)));
    }

    #[test]
    fn test_reset_and_remaining() {
        let budget = RefreshBudget::new(RefreshBudgetConfig::new(3, Duration::from_secs(60)));
        assert_eq!(budget.remaining(), 3);
        assert!(budget.try_acquire());
        assert_eq!(budget.remaining(), 2);
        budget.reset();
        assert_eq!(budget.remaining(), 3);
    }

    #[test]
    fn test_disabled_budget() {
        let budget = RefreshBudget::new(RefreshBudgetConfig::unlimited());
        for _ in 0..100 {
            assert!(budget.try_acquire());
        }
        assert_eq!(budget.remaining(), u32::MAX);
    }
}
