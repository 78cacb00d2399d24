use crate::{connection::Connection, error::BoxError};

/// Caller-supplied lifecycle listener invoked at created/acquired/
/// released transitions.
///
/// These run inline on whatever thread the triggering operation
/// resolves on and must not block; that requirement is why the methods
/// here are synchronous rather than returning a future. It lets
/// `SimplePool` call `on_released` while still holding the idle
/// stack's lock, so the "push, then notify" ordering in the release
/// algorithm never needs to survive an await point.
///
/// For a single connection these fire in a fixed total order:
/// `on_created` before `on_acquired` before `on_released`, with
/// `on_acquired`/`on_released` alternating for as long as the
/// connection is reused. An error from any hook is not swallowed. It
/// propagates to the caller as a failed acquire/release (observers are
/// a trust boundary, not a best-effort notification).
pub trait PoolHandler<C: Connection>: Send + Sync + 'static {
    /// Invoked exactly once per newly created connection, before it is
    /// delivered to the acquirer.
    fn on_created(&self, _conn: &C, _key: &C::Key) -> Result<(), BoxError> {
        Ok(())
    }

    /// Invoked before delivering a reused, healthy connection.
    fn on_acquired(&self, _conn: &C, _key: &C::Key) -> Result<(), BoxError> {
        Ok(())
    }

    /// Invoked after the connection has been successfully re-inserted
    /// into its idle stack.
    fn on_released(&self, _conn: &C, _key: &C::Key) -> Result<(), BoxError> {
        Ok(())
    }
}

/// The default observer: does nothing at every transition.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHandler;

impl<C: Connection> PoolHandler<C> for NoopHandler {}
