//! Cooperative resource limits.
//!
//! The solver consults the resource manager once per search iteration; when a
//! limit trips, `check_sat` returns `Unknown` and the solver state remains
//! valid, so a later call resumes where search stopped. Cancellation is a
//! shared flag the embedder may flip from another thread.

use crate::stats::Statistics;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Optional caps on search effort.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLimits {
    /// Maximum search-loop iterations.
    pub max_iterations: Option<u64>,
    /// Maximum integer decisions.
    pub max_decisions: Option<u64>,
    /// Maximum conflicts.
    pub max_conflicts: Option<u64>,
}

/// Result of a limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitStatus {
    /// Within all limits.
    Ok,
    /// Iteration cap reached.
    Iterations,
    /// Decision cap reached.
    Decisions,
    /// Conflict cap reached.
    Conflicts,
    /// Cancelled by the embedder.
    Cancelled,
}

/// Tracks limits and the cancellation flag.
#[derive(Debug, Default)]
pub struct ResourceManager {
    limits: ResourceLimits,
    cancel: Arc<AtomicBool>,
}

impl ResourceManager {
    /// Create a manager with the given limits.
    #[must_use]
    pub fn new(limits: ResourceLimits) -> Self {
        Self {
            limits,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Shared handle the embedder can set to interrupt the search.
    #[must_use]
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Replace the limits (takes effect at the next check).
    pub fn set_limits(&mut self, limits: ResourceLimits) {
        self.limits = limits;
    }

    /// Check the current statistics against all limits.
    #[must_use]
    pub fn check(&self, stats: &Statistics) -> LimitStatus {
        if self.cancel.load(Ordering::Relaxed) {
            return LimitStatus::Cancelled;
        }
        if let Some(max) = self.limits.max_iterations {
            if stats.iterations >= max {
                return LimitStatus::Iterations;
            }
        }
        if let Some(max) = self.limits.max_decisions {
            if stats.decisions >= max {
                return LimitStatus::Decisions;
            }
        }
        if let Some(max) = self.limits.max_conflicts {
            if stats.conflicts >= max {
                return LimitStatus::Conflicts;
            }
        }
        LimitStatus::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limits_trip() {
        let rm = ResourceManager::new(ResourceLimits {
            max_conflicts: Some(2),
            ..ResourceLimits::default()
        });
        let mut stats = Statistics::default();
        assert_eq!(rm.check(&stats), LimitStatus::Ok);
        stats.conflicts = 2;
        assert_eq!(rm.check(&stats), LimitStatus::Conflicts);
    }

    #[test]
    fn test_cancellation() {
        let rm = ResourceManager::new(ResourceLimits::default());
        let flag = rm.cancel_flag();
        let stats = Statistics::default();
        assert_eq!(rm.check(&stats), LimitStatus::Ok);
        flag.store(true, Ordering::Relaxed);
        assert_eq!(rm.check(&stats), LimitStatus::Cancelled);
    }
}
