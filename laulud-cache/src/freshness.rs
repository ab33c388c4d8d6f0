//! Freshness contracts for cache reads.
//!
//! Observers state how stale the data they are shown may be. Cached data is
//! always served when present; freshness only decides whether a background
//! refetch is started alongside it.

use std::time::Duration;

/// Freshness requirement for an observation or read.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Freshness {
    /// Serve cached data without refetching while it is younger than
    /// `max_staleness`.
    BestEffort {
        /// Maximum acceptable age of cached data.
        max_staleness: Duration,
    },

    /// Serve cached data, but always refetch on observation.
    #[default]
    Consistent,
}

impl Freshness {
    /// Create a BestEffort freshness with the given max staleness.
    pub fn best_effort(max_staleness: Duration) -> Self {
        Self::BestEffort { max_staleness }
    }

    /// Create a Consistent freshness requirement.
    pub fn consistent() -> Self {
        Self::Consistent
    }

    /// Build from a configured stale time; zero means always refetch.
    pub fn from_stale_time(stale_time: Duration) -> Self {
        if stale_time.is_zero() {
            Self::Consistent
        } else {
            Self::BestEffort {
                max_staleness: stale_time,
            }
        }
    }

    pub fn is_best_effort(&self) -> bool {
        matches!(self, Self::BestEffort { .. })
    }

    pub fn is_consistent(&self) -> bool {
        matches!(self, Self::Consistent)
    }

    /// Get the max staleness for BestEffort, or zero for Consistent.
    pub fn max_staleness(&self) -> Duration {
        match self {
            Self::BestEffort { max_staleness } => *max_staleness,
            Self::Consistent => Duration::ZERO,
        }
    }

    /// Whether data of the given age satisfies this requirement.
    pub fn accepts_age(&self, age: Duration) -> bool {
        match self {
            Self::BestEffort { max_staleness } => age <= *max_staleness,
            Self::Consistent => false,
        }
    }
}
