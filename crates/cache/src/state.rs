//! Consumer-facing state types: freshness policies, the tri-state
//! exposure contract and the error payload it carries.

use std::sync::Arc;
use std::time::Duration;

/// How long a cached value may be served without revalidation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Serve without a network call while the entry is younger than the
    /// window. Five minutes is the recurring convention for listings.
    FreshFor(Duration),
    /// Never considered stale within a session; refetched only after an
    /// explicit invalidation. Used for the user's own profile.
    SessionLong,
    /// Revalidated on every read. Used for dashboards whose counts change
    /// underneath the user.
    AlwaysRevalidate,
}

/// Why a resource could not be fetched.
///
/// Views pick their retry affordance from this: an `Unauthorized` read
/// tears the session down, a `NotFound` renders an empty state in place,
/// and a `Transport` failure offers a retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Unauthorized,
    NotFound,
    /// The server rejected the request and said why.
    Rejected,
    /// No usable response was received.
    Transport,
}

/// Error payload recorded against a cache entry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ResourceError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ResourceError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Snapshot of a cache entry as exposed to consumers.
///
/// Exactly one of the four variants holds at any observation:
/// no data yet, stale data with a refresh under way, fresh data, or a
/// recorded failure.
#[derive(Debug, Clone)]
pub enum ResourceState<T> {
    /// No data has ever been applied for this key.
    Loading,
    /// Last-known data is available but stale; a newer read is pending
    /// or due.
    Refreshing(Arc<T>),
    /// Data is present and within its freshness window.
    Ready(Arc<T>),
    /// The most recent fetch failed and nothing newer has succeeded.
    Failed(ResourceError),
}

impl<T> ResourceState<T> {
    /// The data carried by this state, stale or not.
    pub fn data(&self) -> Option<&Arc<T>> {
        match self {
            ResourceState::Refreshing(data) | ResourceState::Ready(data) => Some(data),
            ResourceState::Loading | ResourceState::Failed(_) => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, ResourceState::Loading)
    }
}
