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
use log::debug;
use parking_lot::Mutex;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, Script};

use crate::adapter::BackendAdapter;
use crate::config::BackendConfig;
use crate::error::{BackendError, Result};
use crate::scripts::{DELETE_IF_MATCH, EXTEND_IF_MATCH};

/// Redis client side encapsulation, providing the locking capability set
/// over a single Redis-compatible node.
///
/// Operations go through a clonable `ConnectionManager`, which multiplexes
/// and reconnects on its own; `disconnect` drops the manager and is
/// idempotent.
pub struct RedisBackend {
    url: String,
    manager: Mutex<Option<ConnectionManager>>,
}

impl RedisBackend {
    /// Connect to the node described by `config`
    ///
    /// # Returns
    ///
    /// Returns the connected backend, or a `BackendError` when the URL is
    /// invalid or the node is unreachable.
    pub async fn connect(config: &BackendConfig) -> Result<Self> {
        let client = Client::open(config.url.as_str()).map_err(BackendError::ConnectionError)?;
        let manager = client.get_tokio_connection_manager().await.map_err(BackendError::ConnectionError)?;
        debug!("Connected to {}", config.url);
        Ok(Self { url: config.url.clone(), manager: Mutex::new(Some(manager)) })
    }

    fn connection(&self) -> Result<ConnectionManager> {
        self.manager.lock().clone().ok_or(BackendError::Disconnected)
    }
}

#[async_trait]
impl BackendAdapter for RedisBackend {
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool> {
        let mut conn = self.connection()?;
        // SET .. NX PX carries the TTL in the same atomic command
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .arg("PX")
            .arg(ttl.as_millis() as u64)
            .query_async(&mut conn)
            .await?;
        Ok(reply.is_some())
    }

    async fn get_value(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.connection()?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn delete_if_match(&self, key: &str, value: &str) -> Result<bool> {
        let mut conn = self.connection()?;
        let deleted: i32 = Script::new(DELETE_IF_MATCH)
            .key(key)
            .arg(value)
            .invoke_async(&mut conn)
            .await?;
        Ok(deleted == 1)
    }

    async fn extend_if_match(&self, key: &str, value: &str, ttl: Duration) -> Result<bool> {
        let mut conn = self.connection()?;
        let extended: i32 = Script::new(EXTEND_IF_MATCH)
            .key(key)
            .arg(value)
            .arg(ttl.as_millis() as u64)
            .invoke_async(&mut conn)
            .await?;
        Ok(extended == 1)
    }

    async fn liveness_check(&self) -> Result<()> {
        let mut conn = self.connection()?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        if self.manager.lock().take().is_some() {
            debug!("Disconnected from {}", self.url);
        }
        Ok(())
    }
}
