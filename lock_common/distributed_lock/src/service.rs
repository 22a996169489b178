/*
 * Copyright (c) Huawei Technologies Co., Ltd. 2025. All rights reserved.
 * Global Trust Authority is licensed under the Mulan PSL v2.
 * You can use this software according to the terms and conditions of the Mulan PSL v2.
 * You may obtain a copy of Mulan PSL v2 at:
 *     http://license.coscl.org.cn/MulanPSL2
 * THIS SOFTWARE IS PROVIDED ON AN "AS IS" BASIS, WITHOUT WARRANTIES OF ANY KIND, EITHER EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO NON-INFRINGEMENT, MERCHANTABILITY OR FIT FOR A PARTICULAR
 * PURPOSE.
 * See the Mulan PSL v2 for more details.
 */

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use lock_backend::BackendAdapter;
use log::{debug, error, info, warn};
use parking_lot::{Mutex, RwLock};

use crate::config::{LockConfig, RetryPolicy, UsingOptions};
use crate::error::{DistributedLockError, Result};
use crate::handle::LockHandle;
use crate::keep_alive::{KeepAlive, LockSignal};
use crate::strategy::{select_strategy, validate_quorum, LockStrategy};

/// Single entry point for distributed lock operations.
///
/// Owns the configured backend nodes, selects the locking strategy for the
/// topology at `init`, retains handles of default-TTL acquisitions, and runs
/// the keep-alive scheduler for `using` critical sections.
pub struct LockService {
    nodes: Vec<Arc<dyn BackendAdapter>>,
    config: LockConfig,
    strategy: RwLock<Option<Arc<dyn LockStrategy>>>,
    retained: Mutex<HashMap<String, LockHandle>>,
    keepers: Mutex<HashMap<u64, KeepAlive>>,
    next_keeper: AtomicU64,
}

impl std::fmt::Debug for LockService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockService")
            .field("nodes", &self.nodes.len())
            .finish_non_exhaustive()
    }
}

impl LockService {
    /// Build the service over `nodes`.
    ///
    /// Fails fast on an empty node set or an out-of-range quorum override;
    /// the configuration is not re-validated per call.
    pub fn new(nodes: Vec<Arc<dyn BackendAdapter>>, config: LockConfig) -> Result<Self> {
        if nodes.is_empty() {
            return Err(DistributedLockError::Configuration(
                "at least one backend node must be configured".to_string(),
            ));
        }
        validate_quorum(config.quorum, nodes.len())?;
        Ok(Self {
            nodes,
            config,
            strategy: RwLock::new(None),
            retained: Mutex::new(HashMap::new()),
            keepers: Mutex::new(HashMap::new()),
            next_keeper: AtomicU64::new(0),
        })
    }

    /// Validate every node and instantiate the strategy for the topology.
    ///
    /// Must run before the first lock operation; operations before it fail
    /// with `NotInitialized`.
    pub async fn init(&self) -> Result<()> {
        for (index, node) in self.nodes.iter().enumerate() {
            node.liveness_check().await.map_err(|e| {
                error!("Backend node {} failed liveness check: {}", index, e);
                DistributedLockError::Backend(e)
            })?;
        }
        let strategy = select_strategy(&self.nodes, self.config.quorum)?;
        info!("Lock service initialized with {} nodes ({} strategy)", self.nodes.len(), strategy.kind());
        *self.strategy.write() = Some(strategy);
        Ok(())
    }

    fn strategy(&self) -> Result<Arc<dyn LockStrategy>> {
        self.strategy.read().clone().ok_or(DistributedLockError::NotInitialized)
    }

    fn validate_key(key: &str) -> Result<()> {
        if key.is_empty() {
            return Err(DistributedLockError::InvalidKey);
        }
        Ok(())
    }

    /// Acquire `key` with the service default TTL, or with `ttl` when given.
    ///
    /// Default-TTL handles are retained for `retained_handle`; explicit-TTL
    /// handles never are, so high-cardinality custom-TTL usage cannot grow
    /// the retained map.
    pub async fn acquire(&self, key: &str, ttl: Option<Duration>) -> Result<LockHandle> {
        self.acquire_with(key, ttl, &self.config.retry_policy()).await
    }

    async fn acquire_with(&self, key: &str, ttl: Option<Duration>, retry: &RetryPolicy) -> Result<LockHandle> {
        Self::validate_key(key)?;
        let strategy = self.strategy()?;
        let effective_ttl = ttl.unwrap_or(self.config.default_ttl);
        let handle = strategy.acquire(key, effective_ttl, retry).await?;
        if ttl.is_none() {
            // Read-and-replaced, never merged
            self.retained.lock().insert(key.to_string(), handle.clone());
        }
        Ok(handle)
    }

    /// Release the lock named by `handle`.
    ///
    /// A lock that already expired or changed hands is not an error; backend
    /// failures surface as `ReleaseFailed`.
    pub async fn release(&self, key: &str, handle: &LockHandle) -> Result<()> {
        Self::validate_key(key)?;
        let strategy = self.strategy()?;
        self.drop_retained(handle);
        if strategy.release(handle).await? {
            debug!("Released lock '{}'", key);
        } else {
            debug!("Lock '{}' was already expired or taken over", key);
        }
        Ok(())
    }

    /// Run `f` under the lock named `key`.
    ///
    /// The protected function never starts before acquisition succeeds. A
    /// keep-alive loop re-extends the TTL while `f` runs and raises the
    /// passed `LockSignal` if an extension fails; `f` is informed, never
    /// aborted. The keep-alive is stopped and release attempted exactly once
    /// on every exit path, after which `f`'s output is returned unchanged.
    pub async fn using<T, F, Fut>(&self, key: &str, options: UsingOptions, f: F) -> Result<T>
    where
        F: FnOnce(LockSignal) -> Fut,
        Fut: Future<Output = T>,
    {
        let retry = RetryPolicy {
            attempts: options.retry_attempts.unwrap_or(self.config.retry_attempts),
            delay: options.retry_delay.unwrap_or(self.config.retry_delay),
        };
        let handle = self.acquire_with(key, options.ttl, &retry).await?;
        let strategy = self.strategy()?;
        let signal = LockSignal::new();
        let keeper_id =
            self.register_keeper(KeepAlive::spawn(strategy.clone(), handle.clone(), handle.ttl, signal.clone()));
        // Stops the keep-alive even if `f` unwinds; the lock itself is then
        // left to expire on its own TTL
        let keeper_guard = KeeperGuard { service: self, id: keeper_id };

        let output = f(signal).await;

        drop(keeper_guard);
        self.drop_retained(&handle);
        if let Err(e) = strategy.release(&handle).await {
            // Cleanup must not replace the critical section's outcome
            error!("Failed to release lock '{}' after critical section: {}", key, e);
        }
        Ok(output)
    }

    /// Last default-TTL handle acquired for `key`, if any
    pub fn retained_handle(&self, key: &str) -> Option<LockHandle> {
        self.retained.lock().get(key).cloned()
    }

    fn drop_retained(&self, handle: &LockHandle) {
        let mut retained = self.retained.lock();
        if retained.get(&handle.key).is_some_and(|kept| kept.value == handle.value) {
            retained.remove(&handle.key);
        }
    }

    fn register_keeper(&self, keeper: KeepAlive) -> u64 {
        let id = self.next_keeper.fetch_add(1, Ordering::SeqCst);
        self.keepers.lock().insert(id, keeper);
        id
    }

    fn stop_keeper(&self, id: u64) {
        if let Some(keeper) = self.keepers.lock().remove(&id) {
            keeper.stop();
        }
    }

    /// Cancel outstanding keep-alive tasks, clear retained handles and
    /// disconnect every backend.
    ///
    /// Best-effort: individual disconnect failures are logged, never raised.
    /// Safe to call more than once.
    pub async fn shutdown(&self) {
        for (_, keeper) in self.keepers.lock().drain() {
            keeper.stop();
        }
        self.retained.lock().clear();
        for (index, node) in self.nodes.iter().enumerate() {
            if let Err(e) = node.disconnect().await {
                warn!("Failed to disconnect backend node {}: {}", index, e);
            }
        }
        *self.strategy.write() = None;
        debug!("Lock service shut down");
    }
}

struct KeeperGuard<'a> {
    service: &'a LockService,
    id: u64,
}

impl Drop for KeeperGuard<'_> {
    fn drop(&mut self) {
        self.service.stop_keeper(self.id);
    }
}
