use std::sync::Arc;

use linked_hash_map::LinkedHashMap;
use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::{connection::Connection, error::PoolError, key::PoolKey, pool::Pool};

type AcquireResult<C> = Result<C, PoolError>;

struct PendingAcquire<K, C> {
    key: K,
    promise: oneshot::Sender<AcquireResult<C>>,
}

/// FIFO queue of pending acquirers, keyed by an ever-increasing ticket
/// so insertion order survives even after removals. The queue is
/// pool-wide rather than per-key: the bounded wrapper's fairness
/// guarantee is global FIFO, not per-key.
struct PendingQueue<K, C> {
    entries: LinkedHashMap<u64, PendingAcquire<K, C>>,
    next_ticket: u64,
}

impl<K, C> PendingQueue<K, C> {
    fn new() -> Self {
        PendingQueue {
            entries: LinkedHashMap::new(),
            next_ticket: 0,
        }
    }

    fn push(&mut self, key: K, promise: oneshot::Sender<AcquireResult<C>>) {
        let ticket = self.next_ticket;
        self.next_ticket = self.next_ticket.wrapping_add(1);
        self.entries.insert(ticket, PendingAcquire { key, promise });
    }

    fn pop(&mut self) -> Option<PendingAcquire<K, C>> {
        self.entries.pop_front().map(|(_, v)| v)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// `acquired_count` and the pending queue held behind one lock, so the
/// decrement-check-dequeue-or-undo sequence in `run_task_queue` is a
/// single atomic step (see DESIGN.md) rather than a
/// counter and a queue synchronized separately.
struct AdmissionState<K, C> {
    acquired: usize,
    pending: PendingQueue<K, C>,
}

struct Inner<K, C, P> {
    pool: P,
    max_connections: usize,
    state: Mutex<AdmissionState<K, C>>,
}

/// Decorates any [`Pool`] with a hard cap on the number of in-flight
/// (acquired, or currently being produced) connections, queueing
/// excess `acquire` calls in strict FIFO order.
///
/// Fairness is global, not per-key: a pending acquirer for one key
/// blocks acquirers behind it even if idle connections exist for their
/// keys. This is an accepted tradeoff: there is no fair scheduling
/// across keys.
pub struct BoundedPool<K, C, P>
where
    K: PoolKey,
    C: Connection<Key = K>,
    P: Pool<K, C>,
{
    inner: Arc<Inner<K, C, P>>,
}

impl<K, C, P> std::fmt::Debug for BoundedPool<K, C, P>
where
    K: PoolKey,
    C: Connection<Key = K>,
    P: Pool<K, C>,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedPool").finish_non_exhaustive()
    }
}

impl<K, C, P> Clone for BoundedPool<K, C, P>
where
    K: PoolKey,
    C: Connection<Key = K>,
    P: Pool<K, C>,
{
    fn clone(&self) -> Self {
        BoundedPool {
            inner: self.inner.clone(),
        }
    }
}

/// Point-in-time admission counters, for callers that want visibility
/// without driving pool behavior off of them (no adaptive sizing is
/// implemented or implied by exposing these).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub in_flight: usize,
    pub pending: usize,
    pub max_connections: usize,
}

impl<K, C, P> BoundedPool<K, C, P>
where
    K: PoolKey,
    C: Connection<Key = K>,
    P: Pool<K, C>,
{
    pub fn new(pool: P, max_connections: usize) -> Result<Self, PoolError> {
        if max_connections == 0 {
            return Err(PoolError::ArgumentError("max_connections must be >= 1"));
        }
        Ok(BoundedPool {
            inner: Arc::new(Inner {
                pool,
                max_connections,
                state: Mutex::new(AdmissionState {
                    acquired: 0,
                    pending: PendingQueue::new(),
                }),
            }),
        })
    }

    pub fn stats(&self) -> PoolStats {
        let state = self.inner.state.lock();
        PoolStats {
            in_flight: state.acquired,
            pending: state.pending.len(),
            max_connections: self.inner.max_connections,
        }
    }

    /// Non-blocking variant of `acquire`: fails immediately with
    /// [`PoolError::WouldBlock`] instead of joining the pending queue
    /// when no admission budget is free.
    pub async fn try_acquire(&self, key: K) -> Result<C, PoolError> {
        if !self.try_admit() {
            self.release_admission();
            return Err(PoolError::WouldBlock);
        }
        let (tx, rx) = oneshot::channel();
        self.dispatch(key, tx);
        rx.await.map_err(|_| PoolError::Cancelled)?
    }

    /// Reserve one unit of admission budget, returning whether the
    /// reservation keeps the in-flight count within `max_connections`.
    /// The reservation is taken unconditionally, even when denied;
    /// callers that don't want to hold a denied reservation (namely
    /// `try_acquire`, which never queues) must release it themselves.
    fn try_admit(&self) -> bool {
        let mut state = self.inner.state.lock();
        state.acquired += 1;
        state.acquired <= self.inner.max_connections
    }

    fn release_admission(&self) {
        let mut state = self.inner.state.lock();
        state.acquired = state.acquired.saturating_sub(1);
    }

    fn begin_acquire(&self, key: K, promise: oneshot::Sender<AcquireResult<C>>) {
        if self.try_admit() {
            tracing::trace!(?key, "admission budget available, dispatching immediately");
            self.dispatch(key, promise);
        } else {
            tracing::debug!(?key, "admission budget exhausted, queueing acquirer");
            self.inner.state.lock().pending.push(key, promise);
        }
    }

    /// Forward an admitted (or dequeued) acquire to the inner pool on
    /// its own task, attaching the decrement-on-complete listener
    /// described in its own doc comment below. Never blocks the caller.
    fn dispatch(&self, key: K, promise: oneshot::Sender<AcquireResult<C>>) {
        let this = self.clone();
        tokio::spawn(async move {
            let result = this.inner.pool.acquire(key).await;
            match &result {
                Ok(conn) => {
                    // Budget stays reserved: the connection is now
                    // "issued", and is released either by an explicit
                    // `release()` call or by this close-listener
                    // observing a remote close. Always attached, so a
                    // checked-out connection that disappears without an
                    // explicit release still replenishes the budget.
                    let closed = conn.closed();
                    let watcher = this.clone();
                    tokio::spawn(async move {
                        closed.await;
                        watcher.run_task_queue();
                    });
                }
                Err(_) => {
                    // `run_task_queue` performs the matching decrement
                    // for this failed attempt's reservation itself.
                    // A separate explicit decrement here would
                    // double-count.
                    this.run_task_queue();
                }
            }
            let _ = promise.send(result);
        });
    }

    /// Replenish the admission budget by one and, if a pending
    /// acquirer exists and the budget allows it, forward it to the
    /// inner pool. Called on release completion and on observing a
    /// checked-out connection close.
    ///
    /// The whole decrement-check-dequeue-or-undo sequence runs under
    /// one lock, so there is no race window to retry: exactly one
    /// decrement and at most one dequeue happen per call.
    fn run_task_queue(&self) {
        let dequeued = {
            let mut state = self.inner.state.lock();
            state.acquired = state.acquired.saturating_sub(1);
            if state.acquired <= self.inner.max_connections {
                match state.pending.pop() {
                    Some(pending) => Some(pending),
                    None => {
                        // Nothing waiting, give the slot back.
                        state.acquired += 1;
                        None
                    }
                }
            } else {
                None
            }
        };
        if let Some(pending) = dequeued {
            tracing::debug!("admitting queued acquirer");
            self.dispatch(pending.key, pending.promise);
        }
    }
}

impl<K, C, P> Pool<K, C> for BoundedPool<K, C, P>
where
    K: PoolKey,
    C: Connection<Key = K>,
    P: Pool<K, C>,
{
    async fn acquire(&self, key: K) -> Result<C, PoolError> {
        let (tx, rx) = oneshot::channel();
        self.begin_acquire(key, tx);
        rx.await.map_err(|_| PoolError::Cancelled)?
    }

    async fn release(&self, conn: C) -> Result<bool, PoolError> {
        if !conn.is_active() {
            // The close-listener registered in `dispatch` has already
            // (or will shortly) run `run_task_queue` for this
            // connection, so the admission budget is not leaked even
            // though we short-circuit here without touching it.
            return Ok(false);
        }
        let result = self.inner.pool.release(conn).await;
        self.run_task_queue();
        result
    }
}
