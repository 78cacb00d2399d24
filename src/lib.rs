#![cfg_attr(not(doctest), doc = include_str!("../README.md"))]

mod bounded;
mod connection;
mod error;
mod factory;
mod health;
mod key;
mod observer;
mod pool;
mod simple;

#[cfg(test)]
mod testing;

pub use bounded::{BoundedPool, PoolStats};
pub use connection::{Connection, KeySlot};
pub use error::{BoxError, PoolError};
pub use factory::ConnectionFactory;
pub use health::{ActiveHealthChecker, HealthChecker, ACTIVE_HEALTH_CHECKER};
pub use key::{DefaultKey, ExecutorId, PoolKey};
pub use observer::{NoopHandler, PoolHandler};
pub use pool::Pool;
pub use simple::{SimplePool, SimplePoolBuilder};
