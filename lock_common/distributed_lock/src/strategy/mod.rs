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
use std::time::Duration;

use async_trait::async_trait;
use lock_backend::BackendAdapter;
use uuid::Uuid;

use crate::config::{RetryPolicy, REDLOCK_MIN_NODES};
use crate::error::{DistributedLockError, Result};
use crate::handle::{LockHandle, StrategyKind};

mod redlock;
mod simple;

pub use redlock::RedlockStrategy;
pub use simple::SimpleStrategy;

/// Acquisition, release and extension algorithm executed against the
/// configured backend nodes.
///
/// Per-node failures are handled inside the strategy; callers only see the
/// overall outcome.
#[async_trait]
pub trait LockStrategy: Send + Sync {
    /// Which variant this strategy is
    fn kind(&self) -> StrategyKind;

    /// Acquire `key` for `ttl`, retrying per `retry` with a fresh fencing
    /// value on every attempt
    async fn acquire(&self, key: &str, ttl: Duration, retry: &RetryPolicy) -> Result<LockHandle>;

    /// Conditionally delete the lock named by `handle`.
    ///
    /// `Ok(false)` means the lock had already expired or changed hands,
    /// which is not an error.
    async fn release(&self, handle: &LockHandle) -> Result<bool>;

    /// Conditionally refresh the lock's TTL.
    ///
    /// `Ok(false)` means ownership was lost.
    async fn extend(&self, handle: &LockHandle, ttl: Duration) -> Result<bool>;
}

/// Pick the strategy for the configured topology: one or two nodes lock
/// against a single authoritative node, three or more run the quorum
/// algorithm.
pub fn select_strategy(
    nodes: &[Arc<dyn BackendAdapter>],
    quorum: Option<usize>,
) -> Result<Arc<dyn LockStrategy>> {
    if nodes.is_empty() {
        return Err(DistributedLockError::Configuration(
            "at least one backend node must be configured".to_string(),
        ));
    }
    if nodes.len() >= REDLOCK_MIN_NODES {
        Ok(Arc::new(RedlockStrategy::new(nodes.to_vec(), quorum)?))
    } else {
        Ok(Arc::new(SimpleStrategy::new(nodes[0].clone())))
    }
}

/// Check a quorum override against the node count: it must be at least 1 and
/// at most the number of nodes
pub(crate) fn validate_quorum(quorum: Option<usize>, nodes: usize) -> Result<()> {
    if let Some(quorum) = quorum {
        if quorum < 1 || quorum > nodes {
            return Err(DistributedLockError::InvalidQuorum { quorum, nodes });
        }
    }
    Ok(())
}

/// Fencing token for one acquisition attempt; never reused
pub(crate) fn fresh_value() -> String {
    Uuid::new_v4().to_string()
}
