//! Observable state snapshots.

use std::fmt;
use std::sync::Arc;

/// Lifecycle of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryStatus {
    /// Never fetched (or disabled).
    #[default]
    Idle,
    /// First fetch in flight, no data yet.
    Loading,
    /// Data available.
    Success,
    /// Last fetch failed.
    Error,
}

/// Snapshot of a query's state.
pub struct QueryState<T, E> {
    pub status: QueryStatus,
    pub data: Option<Arc<T>>,
    pub error: Option<E>,
    /// A fetch is in flight (including background refetches).
    pub is_fetching: bool,
    /// Consecutive failed attempts of the last fetch.
    pub failure_count: u32,
}

impl<T, E> QueryState<T, E> {
    /// Initial state: idle, optionally seeded with cached data.
    pub fn idle(data: Option<Arc<T>>) -> Self {
        Self {
            status: if data.is_some() {
                QueryStatus::Success
            } else {
                QueryStatus::Idle
            },
            data,
            error: None,
            is_fetching: false,
            failure_count: 0,
        }
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

    /// Borrow the data, if any.
    pub fn data(&self) -> Option<&T> {
        self.data.as_deref()
    }
}

impl<T, E: Clone> Clone for QueryState<T, E> {
    fn clone(&self) -> Self {
        Self {
            status: self.status,
            data: self.data.clone(),
            error: self.error.clone(),
            is_fetching: self.is_fetching,
            failure_count: self.failure_count,
        }
    }
}

impl<T: fmt::Debug, E: fmt::Debug> fmt::Debug for QueryState<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryState")
            .field("status", &self.status)
            .field("data", &self.data)
            .field("error", &self.error)
            .field("is_fetching", &self.is_fetching)
            .field("failure_count", &self.failure_count)
            .finish()
    }
}

/// Lifecycle of a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MutationStatus {
    #[default]
    Idle,
    Pending,
    Success,
    Error,
}

/// Snapshot of a mutation's state.
pub struct MutationState<T, E> {
    pub status: MutationStatus,
    pub data: Option<Arc<T>>,
    pub error: Option<E>,
}

impl<T, E> MutationState<T, E> {
    pub fn idle() -> Self {
        Self {
            status: MutationStatus::Idle,
            data: None,
            error: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == MutationStatus::Pending
    }

    pub fn is_success(&self) -> bool {
        self.status == MutationStatus::Success
    }

    pub fn is_error(&self) -> bool {
        self.status == MutationStatus::Error
    }
}

impl<T, E: Clone> Clone for MutationState<T, E> {
    fn clone(&self) -> Self {
        Self {
            status: self.status,
            data: self.data.clone(),
            error: self.error.clone(),
        }
    }
}

impl<T: fmt::Debug, E: fmt::Debug> fmt::Debug for MutationState<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutationState")
            .field("status", &self.status)
            .field("data", &self.data)
            .field("error", &self.error)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_state_seeded_with_data_is_success() {
        let state: QueryState<u32, String> = QueryState::idle(Some(Arc::new(3)));
        assert!(state.is_success());
        assert_eq!(state.data(), Some(&3));

        let empty: QueryState<u32, String> = QueryState::idle(None);
        assert_eq!(empty.status, QueryStatus::Idle);
        assert!(empty.data().is_none());
    }

    #[test]
    fn test_mutation_state_idle() {
        let state: MutationState<u32, String> = MutationState::idle();
        assert!(!state.is_pending());
        assert!(!state.is_success());
        assert!(!state.is_error());
    }
}
