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

use std::pin::pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::sleep;

use crate::handle::LockHandle;
use crate::strategy::LockStrategy;

/// How many extension windows fit in one TTL; the keep-alive loop fires
/// every `ttl / EXTEND_INTERVAL_DIVISOR`
const EXTEND_INTERVAL_DIVISOR: u32 = 3;

/// Flag raised when a keep-alive extension fails and lock ownership may have
/// been lost.
///
/// Single writer (the keep-alive loop), any number of readers. The protected
/// function is informed through this flag and decides for itself how to
/// stop; nothing is aborted from the outside.
#[derive(Clone, Default)]
pub struct LockSignal {
    lost: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl LockSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether lock ownership may have been lost
    pub fn is_lost(&self) -> bool {
        self.lost.load(Ordering::SeqCst)
    }

    /// Resolve once ownership may have been lost
    pub async fn lost(&self) {
        let mut notified = pin!(self.notify.notified());
        notified.as_mut().enable();
        if self.is_lost() {
            return;
        }
        notified.await;
    }

    fn mark_lost(&self) {
        self.lost.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }
}

/// Recurring TTL extension for a held lock, running until stopped or until
/// an extension fails
pub(crate) struct KeepAlive {
    stop: Arc<Notify>,
    task: JoinHandle<()>,
}

impl KeepAlive {
    /// Spawn the extension loop for `handle`, firing at a third of the TTL
    pub(crate) fn spawn(
        strategy: Arc<dyn LockStrategy>,
        handle: LockHandle,
        ttl: Duration,
        signal: LockSignal,
    ) -> Self {
        let stop = Arc::new(Notify::new());
        let stop_rx = stop.clone();
        let task = tokio::spawn(async move {
            let interval = ttl / EXTEND_INTERVAL_DIVISOR;
            loop {
                tokio::select! {
                    _ = stop_rx.notified() => break,
                    _ = sleep(interval) => {
                        match strategy.extend(&handle, ttl).await {
                            Ok(true) => debug!("Extended lock '{}' by {:?}", handle.key, ttl),
                            Ok(false) => {
                                error!("Lost ownership of lock '{}' during extension", handle.key);
                                signal.mark_lost();
                                break;
                            },
                            Err(e) => {
                                error!("Failed to extend lock '{}': {}", handle.key, e);
                                signal.mark_lost();
                                break;
                            },
                        }
                    },
                }
            }
        });
        Self { stop, task }
    }

    /// Cancel the loop; safe to call any number of times
    pub(crate) fn stop(&self) {
        self.stop.notify_one();
        self.task.abort();
    }
}
