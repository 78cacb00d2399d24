use futures::future::BoxFuture;
use parking_lot::Mutex;

use crate::{error::PoolError, key::PoolKey};

/// The mutable `pool_key` attribute every pooled connection carries.
///
/// This is the reverse-lookup mechanism `release` uses to find which
/// idle stack a connection belongs to: present and equal to `K` while
/// the connection sits idle, absent while it is checked out. Modeled
/// as plain data (the key value itself) rather than a handle back into
/// the pool, so a connection never holds a strong or weak reference to
/// its owning pool.
pub struct KeySlot<K> {
    slot: Mutex<Option<K>>,
}

impl<K> Default for KeySlot<K> {
    fn default() -> Self {
        KeySlot {
            slot: Mutex::new(None),
        }
    }
}

impl<K: Clone> KeySlot<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the attribute, e.g. right after a new connection is
    /// established and before `on_created` runs.
    pub fn set(&self, key: K) {
        *self.slot.lock() = Some(key);
    }

    /// Atomically read and clear the attribute. Used by `release` to
    /// recover the owning key; an absent value means the connection is
    /// foreign to this pool or was already released.
    pub fn take(&self) -> Option<K> {
        self.slot.lock().take()
    }

    pub fn get(&self) -> Option<K> {
        self.slot.lock().clone()
    }
}

/// The capability set a pooled connection must provide.
///
/// `is_active`/`close`/`closed` are the minimal transport surface the
/// pool needs; everything protocol-specific (codecs, handshakes,
/// request framing) lives above this trait in the caller's client
/// code.
pub trait Connection: Send + 'static {
    type Key: PoolKey;

    /// Cheap, synchronous liveness check. Backs the default health
    /// checker and the bounded wrapper's release-path short-circuit.
    fn is_active(&self) -> bool;

    /// Close this connection. Closing is always delegated to the
    /// connection; the pool never assumes ownership of final
    /// destruction, it only drops its reference.
    fn close(&self) -> BoxFuture<'static, Result<(), PoolError>>;

    /// Resolves once the connection has closed, whether the caller
    /// asked for it (via `close`) or the close was remote-initiated.
    /// Used by `BoundedPool` to replenish its admission budget when a
    /// checked-out connection disappears without an explicit release.
    fn closed(&self) -> BoxFuture<'static, ()>;

    /// The `pool_key` attribute slot (see [`KeySlot`]).
    fn key_slot(&self) -> &KeySlot<Self::Key>;
}
