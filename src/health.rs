use futures::future::{self, BoxFuture};

use crate::connection::Connection;

/// Produces an eventual verdict on whether a previously-idle connection
/// may still be delivered to an acquirer.
///
/// The verdict may be resolved synchronously (eager, e.g. the default
/// [`ActiveHealthChecker`]) or asynchronously (e.g. a round-trip ping);
/// `SimplePool::acquire` awaits it either way and treats "already
/// complete" and "completes later" identically.
pub trait HealthChecker<C: Connection>: Send + Sync + 'static {
    fn is_healthy<'a>(&'a self, conn: &'a C, key: &'a C::Key) -> BoxFuture<'a, bool>;
}

/// The default "always healthy" checker. A zero-sized unit struct, so
/// using it costs nothing to construct and needs no global mutable
/// state.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActiveHealthChecker;

/// Shared default instance.
pub const ACTIVE_HEALTH_CHECKER: ActiveHealthChecker = ActiveHealthChecker;

impl<C: Connection> HealthChecker<C> for ActiveHealthChecker {
    fn is_healthy<'a>(&'a self, conn: &'a C, _key: &'a C::Key) -> BoxFuture<'a, bool> {
        Box::pin(future::ready(conn.is_active()))
    }
}
