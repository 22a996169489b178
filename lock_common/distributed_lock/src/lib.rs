//! Distributed lock module, providing mutual exclusion coordinated through
//! one or more Redis-compatible backends: a single-node strategy for small
//! topologies, quorum (Redlock) locking for three or more nodes, bounded
//! retry, identity-bound release and keep-alive TTL extension

pub mod config;
pub mod decorator;
pub mod error;
pub mod handle;
pub mod keep_alive;
pub mod service;
pub mod strategy;

pub use config::{LockConfig, RetryPolicy, UsingOptions};
pub use decorator::{LockKey, LockedCall};
pub use error::{DistributedLockError, Result};
pub use handle::{LockHandle, LockMetadata, StrategyKind};
pub use keep_alive::LockSignal;
pub use service::LockService;
pub use strategy::{LockStrategy, RedlockStrategy, SimpleStrategy};
