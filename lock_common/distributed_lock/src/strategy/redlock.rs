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

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::future::join_all;
use lock_backend::{BackendAdapter, BackendError};
use log::{debug, warn};
use tokio::time::sleep;

use super::{fresh_value, validate_quorum, LockStrategy};
use crate::config::RetryPolicy;
use crate::error::{DistributedLockError, Result};
use crate::handle::{LockHandle, StrategyKind};

/// Fraction of the TTL budgeted for clock drift between nodes
const CLOCK_DRIFT_FACTOR: f64 = 0.01;

/// Fixed padding added on top of the proportional drift margin
const CLOCK_DRIFT_PADDING: Duration = Duration::from_millis(2);

/// Quorum locking across three or more independent nodes (the Redlock
/// algorithm).
///
/// An acquisition counts only if a majority of nodes accepted the value AND
/// the fan-out itself left a positive validity window after subtracting the
/// clock drift margin from the TTL.
pub struct RedlockStrategy {
    nodes: Vec<Arc<dyn BackendAdapter>>,
    quorum: usize,
}

impl std::fmt::Debug for RedlockStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedlockStrategy")
            .field("nodes", &self.nodes.len())
            .field("quorum", &self.quorum)
            .finish()
    }
}

impl RedlockStrategy {
    /// Build the strategy over `nodes`.
    ///
    /// `quorum` overrides the node-count majority and must satisfy
    /// `1 <= quorum <= nodes.len()`.
    pub fn new(nodes: Vec<Arc<dyn BackendAdapter>>, quorum: Option<usize>) -> Result<Self> {
        validate_quorum(quorum, nodes.len())?;
        let quorum = quorum.unwrap_or(nodes.len() / 2 + 1);
        Ok(Self { nodes, quorum })
    }

    fn drift(ttl: Duration) -> Duration {
        ttl.mul_f64(CLOCK_DRIFT_FACTOR) + CLOCK_DRIFT_PADDING
    }

    /// One full fan-out attempt. Returns the handle when quorum was reached
    /// with a positive validity window; otherwise cleans up and returns None.
    async fn try_acquire(&self, key: &str, value: &str, ttl: Duration) -> Option<LockHandle> {
        let start = Instant::now();
        let results = join_all(self.nodes.iter().map(|node| node.set_if_absent(key, value, ttl))).await;
        let elapsed = start.elapsed();

        let mut successes = 0;
        for (index, result) in results.iter().enumerate() {
            match result {
                Ok(true) => successes += 1,
                Ok(false) => {},
                Err(e) => warn!("Node {} failed to set lock '{}': {}", index, key, e),
            }
        }

        let validity = ttl.checked_sub(elapsed + Self::drift(ttl));
        if successes >= self.quorum && validity.is_some() {
            debug!("Acquired lock '{}' on {}/{} nodes", key, successes, self.nodes.len());
            return Some(LockHandle::new(key, value, ttl, StrategyKind::Redlock));
        }

        // A node whose reply was lost may still hold the value, so the
        // cleanup covers every node, not just those that reported success.
        self.unlock_all(key, value).await;
        None
    }

    /// Conditional delete fanned out to every node; per-node failures are
    /// tolerated and logged
    async fn unlock_all(&self, key: &str, value: &str) -> (usize, usize) {
        let results = join_all(self.nodes.iter().map(|node| node.delete_if_match(key, value))).await;
        let mut deleted = 0;
        let mut errors = 0;
        for (index, result) in results.iter().enumerate() {
            match result {
                Ok(true) => deleted += 1,
                Ok(false) => {},
                Err(e) => {
                    errors += 1;
                    warn!("Node {} failed to release lock '{}': {}", index, key, e);
                },
            }
        }
        (deleted, errors)
    }
}

#[async_trait]
impl LockStrategy for RedlockStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Redlock
    }

    async fn acquire(&self, key: &str, ttl: Duration, retry: &RetryPolicy) -> Result<LockHandle> {
        for attempt in 1..=retry.attempts {
            // Fresh value per attempt: a stale unlock from an earlier attempt
            // must not be able to release a lock acquired by a later one.
            let value = fresh_value();
            if let Some(handle) = self.try_acquire(key, &value, ttl).await {
                return Ok(handle);
            }
            debug!("Quorum not reached for lock '{}' (attempt {}/{})", key, attempt, retry.attempts);
            if attempt < retry.attempts {
                sleep(retry.delay).await;
            }
        }
        Err(DistributedLockError::AcquireFailed { key: key.to_string(), attempts: retry.attempts })
    }

    async fn release(&self, handle: &LockHandle) -> Result<bool> {
        let (deleted, errors) = self.unlock_all(&handle.key, &handle.value).await;
        if errors == self.nodes.len() {
            return Err(DistributedLockError::ReleaseFailed {
                key: handle.key.clone(),
                source: BackendError::OperationError(format!("all {} nodes failed to delete", errors)),
            });
        }
        Ok(deleted > 0)
    }

    async fn extend(&self, handle: &LockHandle, ttl: Duration) -> Result<bool> {
        let results =
            join_all(self.nodes.iter().map(|node| node.extend_if_match(&handle.key, &handle.value, ttl))).await;
        let mut extended = 0;
        for (index, result) in results.iter().enumerate() {
            match result {
                Ok(true) => extended += 1,
                Ok(false) => {},
                Err(e) => warn!("Node {} failed to extend lock '{}': {}", index, handle.key, e),
            }
        }
        Ok(extended >= self.quorum)
    }
}
