use futures::future::BoxFuture;

use crate::{connection::Connection, error::BoxError, key::PoolKey};

/// The transport collaborator that creates new connections for a key.
///
/// A factory that wants per-key executor affinity can inspect `key`
/// (see [`PoolKey`]) inside `connect` and decide where to run; no
/// separate bootstrap-cloning step is needed. Setting the `pool_key`
/// attribute so `on_created` observes it already populated is
/// `SimplePool`'s job, not the factory's.
pub trait ConnectionFactory<K: PoolKey>: Send + Sync + 'static {
    type Connection: Connection<Key = K>;

    fn connect<'a>(&'a self, key: &'a K) -> BoxFuture<'a, Result<Self::Connection, BoxError>>;
}
