//! Per-key query state as seen by observers.

use laulud_core::{LauludError, Timestamp};

/// Lifecycle of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryStatus {
    /// Nothing requested (disabled or never observed).
    Idle,
    /// First fetch in flight, no data yet.
    Loading,
    Success,
    Error,
}

impl QueryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryStatus::Idle => "idle",
            QueryStatus::Loading => "loading",
            QueryStatus::Success => "success",
            QueryStatus::Error => "error",
        }
    }
}

/// Snapshot of one cache entry.
///
/// `data` survives a failed refetch, so `status == Error` may still carry the
/// last good value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryState<V> {
    pub status: QueryStatus,
    pub data: Option<V>,
    pub error: Option<LauludError>,
    pub updated_at: Option<Timestamp>,
    /// Marked stale; the next observation refetches.
    pub invalidated: bool,
    /// A request is in flight (including background refetches).
    pub is_fetching: bool,
}

impl<V> Default for QueryState<V> {
    fn default() -> Self {
        Self::idle()
    }
}

impl<V> QueryState<V> {
    pub fn idle() -> Self {
        Self {
            status: QueryStatus::Idle,
            data: None,
            error: None,
            updated_at: None,
            invalidated: false,
            is_fetching: false,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.status == QueryStatus::Idle
    }

    pub fn is_loading(&self) -> bool {
        self.status == QueryStatus::Loading
    }

    pub fn is_success(&self) -> bool {
        self.status == QueryStatus::Success
    }

    pub fn is_error(&self) -> bool {
        self.status == QueryStatus::Error
    }

    pub fn data(&self) -> Option<&V> {
        self.data.as_ref()
    }

    pub fn error(&self) -> Option<&LauludError> {
        self.error.as_ref()
    }

    /// Map the data while keeping the status fields.
    pub fn map<U>(self, f: impl FnOnce(V) -> U) -> QueryState<U> {
        QueryState {
            status: self.status,
            data: self.data.map(f),
            error: self.error,
            updated_at: self.updated_at,
            invalidated: self.invalidated,
            is_fetching: self.is_fetching,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_state() {
        let state: QueryState<u32> = QueryState::idle();
        assert!(state.is_idle());
        assert!(state.data().is_none());
        assert!(!state.is_fetching);
    }

    #[test]
    fn test_map_keeps_status() {
        let state = QueryState {
            status: QueryStatus::Success,
            data: Some(2u32),
            error: None,
            updated_at: None,
            invalidated: true,
            is_fetching: true,
        };
        let mapped = state.map(|n| n.to_string());
        assert!(mapped.is_success());
        assert_eq!(mapped.data(), Some(&"2".to_string()));
        assert!(mapped.invalidated);
        assert!(mapped.is_fetching);
    }
}
