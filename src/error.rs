use std::fmt;

/// Type-erased error from a transport factory or an observer callback.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failure modes surfaced to a caller via the acquire/release promise.
///
/// Unhealthy idle connections and races in per-key idle-stack creation
/// are *not* represented here: they're recovered internally and never
/// reach the caller (see `SimplePool`'s acquire loop).
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    /// The connection factory failed to establish a new connection.
    #[error("failed to establish a new connection: {0}")]
    ConnectFailure(#[source] BoxError),

    /// The lifecycle observer's `on_created` hook returned an error.
    #[error("lifecycle observer rejected a newly created connection: {0}")]
    InitializerFailure(#[source] BoxError),

    /// The lifecycle observer's `on_acquired` or `on_released` hook
    /// returned an error.
    #[error("lifecycle observer failed: {0}")]
    ObserverFailure(#[source] BoxError),

    /// Defensive: `release` was asked to re-pool a connection this pool
    /// never issued, or one that was already released.
    ///
    /// This is never actually constructed on the error path.
    /// `release` reports the same condition as `Ok(false)` instead of
    /// an `Err`. The variant is kept so the error enum documents the
    /// full set of named failure kinds; nothing in this crate builds
    /// one.
    #[allow(dead_code)]
    #[error("release() was called with a connection this pool never issued")]
    ReleaseInvariantViolation,

    /// A caller passed an invalid argument across the public API
    /// boundary (e.g. `max_connections == 0`).
    #[error("invalid argument: {0}")]
    ArgumentError(&'static str),

    /// The pool was dropped, or the acquiring task's own receiver was
    /// dropped, while an acquire was still pending.
    #[error("the pool acquire was cancelled before it completed")]
    Cancelled,

    /// `BoundedPool::try_acquire` found no admission budget available.
    #[error("no admission budget available and blocking was not requested")]
    WouldBlock,
}

impl PoolError {
    pub(crate) fn connect(e: impl Into<BoxError>) -> Self {
        PoolError::ConnectFailure(e.into())
    }

    pub(crate) fn initializer(e: impl Into<BoxError>) -> Self {
        PoolError::InitializerFailure(e.into())
    }

    pub(crate) fn observer(e: impl Into<BoxError>) -> Self {
        PoolError::ObserverFailure(e.into())
    }
}

/// A plain string turned into a `BoxError`, for observer/factory mocks
/// in tests and for callers who don't want to define their own error
/// type.
#[derive(Debug)]
pub struct StringError(pub String);

impl fmt::Display for StringError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for StringError {}
