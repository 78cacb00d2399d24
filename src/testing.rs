//! Mock collaborators shared by the `#[cfg(test)]` modules across this
//! crate: a small mock
//! `Connection`/`ConnectionFactory`/`PoolHandler`/`HealthChecker` set.

use std::{
    marker::PhantomData,
    sync::atomic::{AtomicBool, AtomicU64, Ordering},
};

use futures::future::{self, BoxFuture};
use tokio::sync::watch;

use crate::{
    connection::{Connection, KeySlot},
    error::{BoxError, PoolError, StringError},
    factory::ConnectionFactory,
    health::HealthChecker,
    key::PoolKey,
    observer::PoolHandler,
};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

pub struct MockConnection<K> {
    id: u64,
    active: AtomicBool,
    close_tx: watch::Sender<bool>,
    close_rx: watch::Receiver<bool>,
    key_slot: KeySlot<K>,
}

impl<K> std::fmt::Debug for MockConnection<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockConnection").field("id", &self.id).finish()
    }
}

impl<K: PoolKey> MockConnection<K> {
    pub fn new(id: u64) -> Self {
        let (close_tx, close_rx) = watch::channel(false);
        MockConnection {
            id,
            active: AtomicBool::new(true),
            close_tx,
            close_rx,
            key_slot: KeySlot::new(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::SeqCst);
    }

    /// Simulate a remote-initiated close (e.g. a peer FIN) that the
    /// pool did not request.
    pub fn simulate_remote_close(&self) {
        self.active.store(false, Ordering::SeqCst);
        let _ = self.close_tx.send(true);
    }
}

impl<K: PoolKey> Connection for MockConnection<K> {
    type Key = K;

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn close(&self) -> BoxFuture<'static, Result<(), PoolError>> {
        self.active.store(false, Ordering::SeqCst);
        let tx = self.close_tx.clone();
        Box::pin(async move {
            let _ = tx.send(true);
            Ok(())
        })
    }

    fn closed(&self) -> BoxFuture<'static, ()> {
        let mut rx = self.close_rx.clone();
        Box::pin(async move {
            if *rx.borrow() {
                return;
            }
            let _ = rx.changed().await;
        })
    }

    fn key_slot(&self) -> &KeySlot<K> {
        &self.key_slot
    }
}

pub struct MockFactory<K> {
    created: AtomicU64,
    fail_next: AtomicBool,
    _marker: PhantomData<fn(K)>,
}

impl<K> MockFactory<K> {
    pub fn new() -> Self {
        MockFactory {
            created: AtomicU64::new(0),
            fail_next: AtomicBool::new(false),
            _marker: PhantomData,
        }
    }

    pub fn created_count(&self) -> u64 {
        self.created.load(Ordering::SeqCst)
    }

    pub fn fail_next_connect(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }
}

impl<K: PoolKey> ConnectionFactory<K> for MockFactory<K> {
    type Connection = MockConnection<K>;

    fn connect<'a>(&'a self, _key: &'a K) -> BoxFuture<'a, Result<Self::Connection, BoxError>> {
        Box::pin(async move {
            if self.fail_next.swap(false, Ordering::SeqCst) {
                return Err(Box::new(StringError("mock connect failure".into())) as BoxError);
            }
            self.created.fetch_add(1, Ordering::SeqCst);
            let id = NEXT_ID.fetch_add(1, Ordering::SeqCst);
            Ok(MockConnection::new(id))
        })
    }
}

/// Observer that counts how many times each hook fired, for asserting
/// the created/acquired/released totals a test wants to assert on.
#[derive(Default)]
pub struct CountingHandler {
    created: AtomicU64,
    acquired: AtomicU64,
    released: AtomicU64,
}

impl CountingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn created(&self) -> u64 {
        self.created.load(Ordering::SeqCst)
    }

    pub fn acquired(&self) -> u64 {
        self.acquired.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> u64 {
        self.released.load(Ordering::SeqCst)
    }
}

impl<C: Connection> PoolHandler<C> for CountingHandler {
    fn on_created(&self, _conn: &C, _key: &C::Key) -> Result<(), BoxError> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn on_acquired(&self, _conn: &C, _key: &C::Key) -> Result<(), BoxError> {
        self.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn on_released(&self, _conn: &C, _key: &C::Key) -> Result<(), BoxError> {
        self.released.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Health checker that fails the first `failures` probes it sees, then
/// reports healthy forever after.
pub struct FlakyHealthChecker {
    remaining_failures: AtomicU64,
}

impl FlakyHealthChecker {
    pub fn new(failures: u64) -> Self {
        FlakyHealthChecker {
            remaining_failures: AtomicU64::new(failures),
        }
    }
}

impl<C: Connection> HealthChecker<C> for FlakyHealthChecker {
    fn is_healthy<'a>(&'a self, _conn: &'a C, _key: &'a C::Key) -> BoxFuture<'a, bool> {
        let healthy = self
            .remaining_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                if n == 0 {
                    None
                } else {
                    Some(n - 1)
                }
            })
            .is_err();
        Box::pin(future::ready(healthy))
    }
}
