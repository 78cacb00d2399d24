use std::{fmt::Debug, hash::Hash, net::SocketAddr};

/// Identity under which idle connections are partitioned.
///
/// Two keys are interchangeable from the pool's perspective iff they
/// compare equal; equal keys must also hash equally.
pub trait PoolKey: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

impl<T> PoolKey for T where T: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

/// Identifies an executor a key may be pinned to, by value rather than
/// by holding a handle to the executor itself. Keys must stay cheaply
/// cloneable and comparable, which a trait object isn't.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ExecutorId(pub u64);

/// The concrete pool key used when callers don't need their own: a
/// remote address, plus an optional pinned executor.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DefaultKey {
    address: SocketAddr,
    executor: Option<ExecutorId>,
}

impl DefaultKey {
    pub fn new(address: SocketAddr) -> Self {
        DefaultKey {
            address,
            executor: None,
        }
    }

    pub fn with_executor(address: SocketAddr, executor: ExecutorId) -> Self {
        DefaultKey {
            address,
            executor: Some(executor),
        }
    }

    pub fn remote_address(&self) -> SocketAddr {
        self.address
    }

    pub fn executor(&self) -> Option<ExecutorId> {
        self.executor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_with_same_address_but_different_executor_are_distinct() {
        let addr: SocketAddr = "127.0.0.1:4000".parse().unwrap();
        let k1 = DefaultKey::new(addr);
        let k2 = DefaultKey::with_executor(addr, ExecutorId(1));
        assert_ne!(k1, k2);
    }

    #[test]
    fn keys_with_same_fields_are_equal_and_clone_cheaply() {
        let addr: SocketAddr = "127.0.0.1:4000".parse().unwrap();
        let k1 = DefaultKey::with_executor(addr, ExecutorId(7));
        let k2 = k1.clone();
        assert_eq!(k1, k2);
    }
}
