/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tokio::sync::Notify;

use crate::types::WriteStatus;

/// Tracks bytes accepted from the writer that have not yet been acknowledged by the storage
/// service (queued, accumulating, or part of an in-flight part upload).
///
/// The writer adds bytes as it hands them to the session, the session removes them once the
/// part containing them has been uploaded.
#[derive(Debug)]
pub(super) struct Backpressure {
    buffered: AtomicU64,
    high_water_mark: u64,
    closed: AtomicBool,
    drained: Notify,
}

impl Backpressure {
    pub(super) fn new(high_water_mark: u64) -> Self {
        Self {
            buffered: AtomicU64::new(0),
            high_water_mark,
            closed: AtomicBool::new(false),
            drained: Notify::new(),
        }
    }

    /// Account for `n` newly written bytes
    pub(super) fn acquire(&self, n: u64) -> WriteStatus {
        let buffered = self.buffered.fetch_add(n, Ordering::AcqRel) + n;
        if buffered >= self.high_water_mark {
            WriteStatus::Pause
        } else {
            WriteStatus::Ready
        }
    }

    /// Release `n` bytes that no longer need to be held
    pub(super) fn release(&self, n: u64) {
        let previous = self.buffered.fetch_sub(n, Ordering::AcqRel);
        debug_assert!(previous >= n, "released more bytes than were acquired");
        if previous.saturating_sub(n) < self.high_water_mark {
            self.drained.notify_waiters();
        }
    }

    /// Stop applying backpressure, the session no longer consumes writes.
    pub(super) fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.drained.notify_waiters();
    }

    pub(super) fn buffered(&self) -> u64 {
        self.buffered.load(Ordering::Acquire)
    }

    fn is_ready(&self) -> bool {
        self.closed.load(Ordering::Acquire) || self.buffered() < self.high_water_mark
    }

    /// Wait until buffered bytes drop below the high-water mark (or the session has ended)
    pub(super) async fn ready(&self) {
        loop {
            // register interest before checking so a release in between is not missed
            let drained = self.drained.notified();
            if self.is_ready() {
                return;
            }
            drained.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Backpressure;
    use crate::types::WriteStatus;
    use futures_test::task::new_count_waker;
    use std::future::Future;
    use std::pin::pin;
    use std::sync::Arc;
    use std::task::Context;

    #[test]
    fn test_pause_at_high_water_mark() {
        let bp = Backpressure::new(10);
        assert_eq!(WriteStatus::Ready, bp.acquire(9));
        assert_eq!(WriteStatus::Pause, bp.acquire(1));
        bp.release(5);
        assert_eq!(5, bp.buffered());
        assert_eq!(WriteStatus::Ready, bp.acquire(4));
    }

    #[test]
    fn test_release_below_mark_wakes_waiter() {
        let bp = Backpressure::new(10);
        let _ = bp.acquire(20);
        let (waker, wake_count) = new_count_waker();
        let mut cx = Context::from_waker(&waker);
        let mut ready = pin!(bp.ready());
        assert!(ready.as_mut().poll(&mut cx).is_pending());

        bp.release(5);
        assert_eq!(0, wake_count.get());

        bp.release(6);
        assert_eq!(1, wake_count.get());
        assert!(ready.as_mut().poll(&mut cx).is_ready());
    }

    #[tokio::test]
    async fn test_ready_resolves_after_release() {
        let bp = Arc::new(Backpressure::new(10));
        let _ = bp.acquire(12);

        let waiter = {
            let bp = bp.clone();
            tokio::spawn(async move { bp.ready().await })
        };
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        bp.release(6);
        waiter.await.unwrap();
    }

    #[tokio::test]
    async fn test_ready_resolves_when_closed() {
        let bp = Backpressure::new(1);
        let _ = bp.acquire(100);
        bp.close();
        bp.ready().await;
    }
}
