use tokio::sync::oneshot;

use crate::{connection::Connection, error::PoolError, key::PoolKey};

/// Shared acquire/release surface implemented by [`SimplePool`] and
/// [`BoundedPool`], so the bounded wrapper can wrap "any pool" by
/// composition rather than inheritance.
///
/// [`SimplePool`]: crate::SimplePool
/// [`BoundedPool`]: crate::BoundedPool
pub trait Pool<K, C>: Clone + Send + Sync + 'static
where
    K: PoolKey,
    C: Connection<Key = K>,
{
    /// Acquire a connection for `key`, waiting for it to be produced
    /// (reused from the idle stack, or newly created) before
    /// returning.
    fn acquire(&self, key: K) -> impl std::future::Future<Output = Result<C, PoolError>> + Send;

    /// Return `conn` to the pool. Resolves `true` iff `conn` was
    /// issued by this pool and has been re-pooled; `false` if it was
    /// foreign or already released.
    fn release(&self, conn: C) -> impl std::future::Future<Output = Result<bool, PoolError>> + Send;

    /// Variant of [`acquire`](Pool::acquire) that lets the caller
    /// supply the completion handle, matching the
    /// `acquire(key, promise)` API surface. The default forwards to
    /// `acquire` on a spawned task.
    fn acquire_with(&self, key: K, promise: oneshot::Sender<Result<C, PoolError>>) {
        let this = self.clone();
        tokio::spawn(async move {
            let result = this.acquire(key).await;
            let _ = promise.send(result);
        });
    }
}
