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
use log::{debug, warn};
use tokio::time::sleep;

use super::{fresh_value, LockStrategy};
use crate::config::RetryPolicy;
use crate::error::{DistributedLockError, Result};
use crate::handle::{LockHandle, StrategyKind};

/// Locking against a single authoritative node.
///
/// Used for one- and two-node topologies. With two nodes only the first is
/// authoritative; the second is not consulted, so this mode provides no
/// fault tolerance. That is a documented trade-off of small topologies, not
/// a defect of the strategy.
pub struct SimpleStrategy {
    primary: Arc<dyn BackendAdapter>,
}

impl SimpleStrategy {
    pub fn new(primary: Arc<dyn BackendAdapter>) -> Self {
        Self { primary }
    }
}

#[async_trait]
impl LockStrategy for SimpleStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Simple
    }

    async fn acquire(&self, key: &str, ttl: Duration, retry: &RetryPolicy) -> Result<LockHandle> {
        for attempt in 1..=retry.attempts {
            let value = fresh_value();
            match self.primary.set_if_absent(key, &value, ttl).await {
                Ok(true) => {
                    debug!("Acquired lock '{}' on attempt {}", key, attempt);
                    return Ok(LockHandle::new(key, value, ttl, StrategyKind::Simple));
                },
                Ok(false) => {
                    debug!("Lock '{}' is held elsewhere, retrying (attempt {}/{})", key, attempt, retry.attempts);
                },
                Err(e) => {
                    warn!("Backend error while acquiring lock '{}': {}", key, e);
                },
            }
            if attempt < retry.attempts {
                sleep(retry.delay).await;
            }
        }
        Err(DistributedLockError::AcquireFailed { key: key.to_string(), attempts: retry.attempts })
    }

    async fn release(&self, handle: &LockHandle) -> Result<bool> {
        self.primary
            .delete_if_match(&handle.key, &handle.value)
            .await
            .map_err(|source| DistributedLockError::ReleaseFailed { key: handle.key.clone(), source })
    }

    async fn extend(&self, handle: &LockHandle, ttl: Duration) -> Result<bool> {
        Ok(self.primary.extend_if_match(&handle.key, &handle.value, ttl).await?)
    }
}
