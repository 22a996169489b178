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

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::config::UsingOptions;
use crate::error::{DistributedLockError, Result};
use crate::service::LockService;

/// Lock key for a wrapped call: a fixed string, or a function of the call
/// arguments
pub enum LockKey<A> {
    /// Fixed key used for every invocation
    Literal(String),
    /// Key computed from the exact arguments of each invocation
    Derived(Arc<dyn Fn(&A) -> String + Send + Sync>),
}

/// A "protect this call" specification built once at registration time and
/// applied around each invocation, as explicit composition rather than
/// annotation processing.
///
/// Override setters forward only what was explicitly provided; anything left
/// unset falls through to the service configuration.
pub struct LockedCall<A> {
    service: Arc<LockService>,
    key: LockKey<A>,
    options: UsingOptions,
}

impl<A> LockedCall<A> {
    /// Wrap invocations with a fixed lock key
    pub fn literal(service: Arc<LockService>, key: impl Into<String>) -> Self {
        Self { service, key: LockKey::Literal(key.into()), options: UsingOptions::default() }
    }

    /// Wrap invocations with a key derived from the call arguments
    pub fn derived(service: Arc<LockService>, derive: impl Fn(&A) -> String + Send + Sync + 'static) -> Self {
        Self { service, key: LockKey::Derived(Arc::new(derive)), options: UsingOptions::default() }
    }

    /// Override the lock TTL for this call site
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.options.ttl = Some(ttl);
        self
    }

    /// Override the acquisition attempt count for this call site
    pub fn retry_attempts(mut self, attempts: u32) -> Self {
        self.options.retry_attempts = Some(attempts);
        self
    }

    /// Override the inter-attempt delay for this call site
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.options.retry_delay = Some(delay);
        self
    }

    /// Resolve the lock key against the arguments of one invocation.
    ///
    /// The resolved key must be non-empty; violations fail before any
    /// backend is contacted.
    fn resolve_key(&self, args: &A) -> Result<String> {
        let key = match &self.key {
            LockKey::Literal(key) => key.clone(),
            LockKey::Derived(derive) => derive(args),
        };
        if key.is_empty() {
            return Err(DistributedLockError::InvalidKey);
        }
        Ok(key)
    }

    /// Invoke `f` with `args` under the resolved lock.
    ///
    /// `f` receives the arguments untouched (receiver state travels in the
    /// closure's captures) and its output is returned unchanged after lock
    /// cleanup.
    pub async fn call<T, F, Fut>(&self, args: A, f: F) -> Result<T>
    where
        F: FnOnce(A) -> Fut,
        Fut: Future<Output = T>,
    {
        let key = self.resolve_key(&args)?;
        self.service.using(&key, self.options.clone(), move |_signal| f(args)).await
    }
}
