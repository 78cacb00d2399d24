use std::{collections::HashMap, sync::Arc};

use parking_lot::Mutex;

use crate::{
    connection::Connection,
    error::PoolError,
    factory::ConnectionFactory,
    health::{ActiveHealthChecker, HealthChecker},
    key::PoolKey,
    observer::{NoopHandler, PoolHandler},
    pool::Pool,
};

type IdleStack<C> = Arc<Mutex<Vec<C>>>;

/// Keyed LIFO cache of idle connections, with health-check gating and
/// `pool_key`-attribute-based reverse lookup on release.
///
/// The idle map is itself behind one lock (for key-insertion/lookup
/// only), but pushing and popping connections for an already-known key
/// goes through that key's own `Mutex<Vec<C>>`, so contention on one
/// key's idle stack never blocks another key; only the (fast,
/// non-blocking) structural lookup is briefly shared.
pub struct SimplePool<K, C, F, H = ActiveHealthChecker, O = NoopHandler>
where
    K: PoolKey,
    C: Connection<Key = K>,
    F: ConnectionFactory<K, Connection = C>,
    H: HealthChecker<C>,
    O: PoolHandler<C>,
{
    inner: Arc<Inner<K, C, F, H, O>>,
}

struct Inner<K, C, F, H, O> {
    idle: Mutex<HashMap<K, IdleStack<C>>>,
    factory: F,
    health_checker: H,
    observer: O,
}

impl<K, C, F, H, O> Clone for SimplePool<K, C, F, H, O>
where
    K: PoolKey,
    C: Connection<Key = K>,
    F: ConnectionFactory<K, Connection = C>,
    H: HealthChecker<C>,
    O: PoolHandler<C>,
{
    fn clone(&self) -> Self {
        SimplePool {
            inner: self.inner.clone(),
        }
    }
}

impl<K, C, F> SimplePool<K, C, F, ActiveHealthChecker, NoopHandler>
where
    K: PoolKey,
    C: Connection<Key = K>,
    F: ConnectionFactory<K, Connection = C>,
{
    /// A pool with the default health checker (liveness only) and no
    /// lifecycle observer. Use [`builder`](Self::builder) to customize
    /// either.
    pub fn new(factory: F) -> Self {
        Self::builder(factory).build()
    }

    pub fn builder(factory: F) -> SimplePoolBuilder<K, C, F, ActiveHealthChecker, NoopHandler> {
        SimplePoolBuilder::new(factory, ActiveHealthChecker, NoopHandler)
    }
}

/// Builds a [`SimplePool`], swapping in a custom health checker and/or
/// lifecycle observer before any connection is ever acquired.
pub struct SimplePoolBuilder<K, C, F, H, O> {
    factory: F,
    health_checker: H,
    observer: O,
    _marker: std::marker::PhantomData<fn(K, C)>,
}

// Written out by hand instead of `#[derive]` so the type parameters
// `K`/`C` (which only appear in `PhantomData`) don't spuriously require
// their own bounds.
impl<K, C, F, H, O> SimplePoolBuilder<K, C, F, H, O> {
    fn new(factory: F, health_checker: H, observer: O) -> Self {
        SimplePoolBuilder {
            factory,
            health_checker,
            observer,
            _marker: std::marker::PhantomData,
        }
    }
}

impl<K, C, F, H, O> SimplePoolBuilder<K, C, F, H, O>
where
    K: PoolKey,
    C: Connection<Key = K>,
    F: ConnectionFactory<K, Connection = C>,
    H: HealthChecker<C>,
    O: PoolHandler<C>,
{
    pub fn health_checker<H2: HealthChecker<C>>(
        self,
        health_checker: H2,
    ) -> SimplePoolBuilder<K, C, F, H2, O> {
        SimplePoolBuilder::new(self.factory, health_checker, self.observer)
    }

    pub fn observer<O2: PoolHandler<C>>(self, observer: O2) -> SimplePoolBuilder<K, C, F, H, O2> {
        SimplePoolBuilder::new(self.factory, self.health_checker, observer)
    }

    pub fn build(self) -> SimplePool<K, C, F, H, O> {
        SimplePool {
            inner: Arc::new(Inner {
                idle: Mutex::new(HashMap::new()),
                factory: self.factory,
                health_checker: self.health_checker,
                observer: self.observer,
            }),
        }
    }
}

impl<K, C, F, H, O> SimplePool<K, C, F, H, O>
where
    K: PoolKey,
    C: Connection<Key = K>,
    F: ConnectionFactory<K, Connection = C>,
    H: HealthChecker<C>,
    O: PoolHandler<C>,
{
    pub fn observer(&self) -> &O {
        &self.inner.observer
    }

    /// Number of idle connections currently cached for `key`.
    pub fn idle_count(&self, key: &K) -> usize {
        self.inner
            .idle
            .lock()
            .get(key)
            .map(|stack| stack.lock().len())
            .unwrap_or(0)
    }

    /// Total idle connections across all keys.
    pub fn total_idle(&self) -> usize {
        self.inner
            .idle
            .lock()
            .values()
            .map(|stack| stack.lock().len())
            .sum()
    }

    /// Close every idle connection across all keys and forget them.
    /// Does not affect connections already checked out.
    pub async fn close_all(&self) {
        let stacks: Vec<IdleStack<C>> = self.inner.idle.lock().drain().map(|(_, v)| v).collect();
        for stack in stacks {
            let conns: Vec<C> = std::mem::take(&mut *stack.lock());
            for conn in conns {
                let _ = conn.close().await;
            }
        }
    }

    fn stack_for(&self, key: &K) -> IdleStack<C> {
        let mut idle = self.inner.idle.lock();
        idle.entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(Vec::new())))
            .clone()
    }

    async fn do_acquire(&self, key: K) -> Result<C, PoolError> {
        if let Some(stack) = {
            let idle = self.inner.idle.lock();
            idle.get(&key).cloned()
        } {
            loop {
                let candidate = stack.lock().pop();
                let Some(conn) = candidate else {
                    break;
                };
                if self.inner.health_checker.is_healthy(&conn, &key).await {
                    tracing::trace!(?key, "reusing idle connection");
                    conn.key_slot().set(key.clone());
                    self.inner
                        .observer
                        .on_acquired(&conn, &key)
                        .map_err(PoolError::observer)?;
                    return Ok(conn);
                }
                tracing::trace!(?key, "evicting unhealthy idle connection");
                let _ = conn.close().await;
            }
        }

        tracing::debug!(?key, "no idle connection available, connecting");
        let conn = self
            .inner
            .factory
            .connect(&key)
            .await
            .map_err(PoolError::connect)?;
        conn.key_slot().set(key.clone());
        self.inner
            .observer
            .on_created(&conn, &key)
            .map_err(PoolError::initializer)?;
        Ok(conn)
    }

    async fn do_release(&self, conn: C) -> Result<bool, PoolError> {
        let Some(key) = conn.key_slot().take() else {
            tracing::trace!("release of a connection this pool never issued");
            return Ok(false);
        };
        let stack = self.stack_for(&key);
        let mut guard = stack.lock();
        guard.push(conn);
        let inserted = guard.last().expect("just pushed");
        let result = self
            .inner
            .observer
            .on_released(inserted, &key)
            .map_err(PoolError::observer);
        drop(guard);
        tracing::debug!(?key, "released connection to idle stack");
        result.map(|()| true)
    }
}

impl<K, C, F, H, O> Pool<K, C> for SimplePool<K, C, F, H, O>
where
    K: PoolKey,
    C: Connection<Key = K>,
    F: ConnectionFactory<K, Connection = C>,
    H: HealthChecker<C>,
    O: PoolHandler<C>,
{
    async fn acquire(&self, key: K) -> Result<C, PoolError> {
        self.do_acquire(key).await
    }

    async fn release(&self, conn: C) -> Result<bool, PoolError> {
        self.do_release(conn).await
    }
}
