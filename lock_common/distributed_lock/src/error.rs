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

use lock_backend::BackendError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DistributedLockError {
    #[error("Lock key must be a non-empty string")]
    InvalidKey,

    #[error("Lock service used before initialization")]
    NotInitialized,

    #[error("Failed to acquire lock '{key}' after {attempts} attempts")]
    AcquireFailed { key: String, attempts: u32 },

    #[error("Failed to release lock '{key}': {source}")]
    ReleaseFailed { key: String, source: BackendError },

    #[error("Quorum {quorum} is invalid for {nodes} configured backend nodes")]
    InvalidQuorum { quorum: usize, nodes: usize },

    #[error("Invalid lock configuration: {0}")]
    Configuration(String),

    #[error("Backend operation failed: {0}")]
    Backend(#[from] BackendError),
}

pub type Result<T> = std::result::Result<T, DistributedLockError>;
