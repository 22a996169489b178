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
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::adapter::BackendAdapter;
use crate::error::{BackendError, Result};

/// Stored value with its expiration instant
#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// In-process backend for tests and single-process deployments.
///
/// Entries expire lazily on access. Clones share the same underlying map, so
/// a test can hold a clone to observe what the lock code stored. Not
/// persistent and not shared across processes.
#[derive(Clone)]
pub struct MemoryBackend {
    data: Arc<Mutex<HashMap<String, Entry>>>,
    connected: Arc<AtomicBool>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            data: Arc::new(Mutex::new(HashMap::new())),
            connected: Arc::new(AtomicBool::new(true)),
        }
    }

    fn ensure_connected(&self) -> Result<()> {
        if self.connected.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(BackendError::Disconnected)
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BackendAdapter for MemoryBackend {
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool> {
        self.ensure_connected()?;
        let mut data = self.data.lock();
        match data.get(key) {
            Some(entry) if !entry.is_expired() => Ok(false),
            _ => {
                data.insert(
                    key.to_string(),
                    Entry { value: value.to_string(), expires_at: Instant::now() + ttl },
                );
                Ok(true)
            },
        }
    }

    async fn get_value(&self, key: &str) -> Result<Option<String>> {
        self.ensure_connected()?;
        let mut data = self.data.lock();
        if matches!(data.get(key), Some(entry) if entry.is_expired()) {
            data.remove(key);
            return Ok(None);
        }
        Ok(data.get(key).map(|entry| entry.value.clone()))
    }

    async fn delete_if_match(&self, key: &str, value: &str) -> Result<bool> {
        self.ensure_connected()?;
        let mut data = self.data.lock();
        let matched = matches!(data.get(key), Some(entry) if !entry.is_expired() && entry.value == value);
        if matched {
            data.remove(key);
        }
        Ok(matched)
    }

    async fn extend_if_match(&self, key: &str, value: &str, ttl: Duration) -> Result<bool> {
        self.ensure_connected()?;
        let mut data = self.data.lock();
        match data.get_mut(key) {
            Some(entry) if !entry.is_expired() && entry.value == value => {
                entry.expires_at = Instant::now() + ttl;
                Ok(true)
            },
            _ => Ok(false),
        }
    }

    async fn liveness_check(&self) -> Result<()> {
        self.ensure_connected()
    }

    async fn disconnect(&self) -> Result<()> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }
}
