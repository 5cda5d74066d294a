//! Error surface of the façade, plus the mapping from wrapper errors
//! onto the cache's retry-affordance kinds.

use psiclin_api::ApiError;
use psiclin_cache::{CacheError, ErrorKind, ResourceError};
use psiclin_store::StoreError;

/// Errors surfaced by [`PracticeClient`](crate::PracticeClient).
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// A mutation or session call failed at the endpoint
    #[error(transparent)]
    Api(#[from] ApiError),
    /// The local store failed
    #[error(transparent)]
    Store(#[from] StoreError),
    /// A cached-resource read failed; carries the classified kind so the
    /// caller can pick its retry affordance
    #[error("resource unavailable: {0}")]
    Resource(ResourceError),
    /// A coordinator-level failure (key serialisation, type mismatch)
    #[error(transparent)]
    Cache(CacheError),
}

impl From<CacheError> for ClientError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::Fetch(resource) => ClientError::Resource(resource),
            other => ClientError::Cache(other),
        }
    }
}

/// Classifies a wrapper error for the cache entry it failed to fill.
pub(crate) fn resource_error(err: ApiError) -> ResourceError {
    let kind = match &err {
        ApiError::Unauthorized => ErrorKind::Unauthorized,
        ApiError::NotFound => ErrorKind::NotFound,
        // 5xx and no-response failures are worth a retry.
        ApiError::Transport(_) | ApiError::Server { .. } => ErrorKind::Transport,
        _ => ErrorKind::Rejected,
    };
    ResourceError::new(kind, err.to_string())
}
