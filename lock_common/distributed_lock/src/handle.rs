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

use std::fmt;
use std::time::{Duration, Instant};

/// Strategy variant that produced a lock handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    /// Single authoritative node
    Simple,
    /// Quorum across three or more nodes
    Redlock,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Simple => "simple",
            StrategyKind::Redlock => "redlock",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bookkeeping recorded with every successful acquisition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockMetadata {
    /// Strategy that performed the acquisition
    pub strategy: StrategyKind,
}

/// Proof of one successful acquisition.
///
/// Owned by the caller that acquired the lock and passed back unmodified to
/// release or extend it. The value is the fencing token proving ownership;
/// it is never reused across acquisitions, even for the same key.
#[derive(Debug, Clone)]
pub struct LockHandle {
    /// Key identifying the contended resource
    pub key: String,
    /// Fencing token generated fresh for this acquisition
    pub value: String,
    /// TTL the lock was acquired with
    pub ttl: Duration,
    /// Instant the acquisition succeeded
    pub acquired_at: Instant,
    /// Acquisition bookkeeping
    pub metadata: LockMetadata,
}

impl LockHandle {
    pub fn new(key: impl Into<String>, value: impl Into<String>, ttl: Duration, strategy: StrategyKind) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            ttl,
            acquired_at: Instant::now(),
            metadata: LockMetadata { strategy },
        }
    }
}
