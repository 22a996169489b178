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

use crate::error::{BackendError, Result};

/// Connection settings for a single backend node
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Redis connection URL, e.g. `redis://127.0.0.1:6379`
    pub url: String,
}

impl BackendConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Read the node URL from the `REDIS_URL` environment variable
    ///
    /// # Returns
    ///
    /// Returns the config on success, or a `BackendError` when the variable
    /// is not set.
    pub fn from_env() -> Result<Self> {
        let url = std::env::var("REDIS_URL")
            .map_err(|_| BackendError::OperationError("REDIS_URL environment variable not set".to_string()))?;
        Ok(Self { url })
    }
}
