//! Backend adapter module, providing the key-value capability set that
//! distributed locking requires over Redis-compatible stores

pub mod adapter;
pub mod client;
pub mod config;
pub mod error;
pub mod memory;
pub mod scripts;

pub use adapter::BackendAdapter;
pub use client::RedisBackend;
pub use config::BackendConfig;
pub use error::{BackendError, Result};
pub use memory::MemoryBackend;
