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

/// TTL applied when neither the call nor the service configures one
pub const DEFAULT_TTL: Duration = Duration::from_millis(30_000);

/// Default number of acquisition attempts
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;

/// Default fixed delay between acquisition attempts
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(200);

/// Minimum node count for the quorum strategy
pub const REDLOCK_MIN_NODES: usize = 3;

/// Service-wide lock settings, consumed once at construction.
///
/// There are no process-global defaults; every `LockService` carries its own
/// config.
#[derive(Debug, Clone)]
pub struct LockConfig {
    /// TTL applied when an operation does not pass one explicitly
    pub default_ttl: Duration,
    /// Acquisition attempts before giving up
    pub retry_attempts: u32,
    /// Fixed delay between acquisition attempts; no backoff
    pub retry_delay: Duration,
    /// Quorum override; defaults to a node-count majority when unset
    pub quorum: Option<usize>,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            default_ttl: DEFAULT_TTL,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
            quorum: None,
        }
    }
}

impl LockConfig {
    pub(crate) fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy { attempts: self.retry_attempts, delay: self.retry_delay }
    }
}

/// Bounded retry settings for one acquisition call
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

/// Per-call overrides for `LockService::using`.
///
/// Fields left unset fall through to the service configuration.
#[derive(Debug, Clone, Default)]
pub struct UsingOptions {
    pub ttl: Option<Duration>,
    pub retry_attempts: Option<u32>,
    pub retry_delay: Option<Duration>,
}

impl UsingOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = Some(attempts);
        self
    }

    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = Some(delay);
        self
    }
}
