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

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

/// Capability set a Redis-compatible key-value node must expose to
/// participate in locking.
///
/// Every operation is a single atomic remote call, so adapters can be shared
/// freely across strategies and lock keys without in-process locking.
#[async_trait]
pub trait BackendAdapter: Send + Sync {
    /// Atomically store `value` under `key` with the given TTL, unless the
    /// key already holds an unexpired value.
    ///
    /// # Returns
    ///
    /// Returns `Ok(true)` when the value was stored, `Ok(false)` when the key
    /// was already held.
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool>;

    /// Read the value currently stored under `key`.
    async fn get_value(&self, key: &str) -> Result<Option<String>>;

    /// Atomically delete `key`, but only if it still holds `value`.
    ///
    /// # Returns
    ///
    /// Returns `Ok(true)` when the key was deleted, `Ok(false)` when it was
    /// absent or held a different value.
    async fn delete_if_match(&self, key: &str, value: &str) -> Result<bool>;

    /// Atomically refresh the TTL of `key`, but only if it still holds
    /// `value`.
    ///
    /// # Returns
    ///
    /// Returns `Ok(true)` when the TTL was refreshed, `Ok(false)` when the
    /// key was absent or held a different value.
    async fn extend_if_match(&self, key: &str, value: &str, ttl: Duration) -> Result<bool>;

    /// Health probe used for topology validation, never on the locking hot
    /// path.
    async fn liveness_check(&self) -> Result<()>;

    /// Tear down the connection. Idempotent; later operations fail with
    /// `BackendError::Disconnected`.
    async fn disconnect(&self) -> Result<()>;
}
