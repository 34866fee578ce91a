// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use crate::client::work::WorkItem;

/// The cross-thread request/response plane's deque half (§4.1).
///
/// Caller threads call [`RequestQueue::submit`]; the loop thread calls
/// [`RequestQueue::drain_and_dispatch`] when the notifier wakes it. The
/// queue itself never blocks: `submit` only appends and wakes, `drain`
/// only pops and (on re-queue) pushes back.
pub struct RequestQueue {
    inner: Mutex<VecDeque<WorkItem>>,
    notifier: Arc<mio::Waker>,
}

impl RequestQueue {
    pub fn new(notifier: Arc<mio::Waker>) -> Self {
        Self { inner: Mutex::new(VecDeque::new()), notifier }
    }

    /// Appends `item` to the right of the deque and signals the notifier.
    /// Safe to call from any number of caller threads concurrently.
    pub fn submit(&self, item: WorkItem) {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).push_back(item);
        // A failed wake means the loop thread (and its mio::Poll) is gone;
        // the item stays queued and is simply never picked up, matching a
        // client that has already shut down.
        let _ = self.notifier.wake();
    }

    /// Signals the notifier with nothing new to submit. Used by the loop
    /// thread itself after releasing a connection, so a work item it just
    /// reposted (because the pool was empty) gets retried on the very next
    /// wake instead of waiting for an unrelated caller to submit something.
    pub fn wake(&self) {
        let _ = self.notifier.wake();
    }

    /// Snapshot of how many work items are currently queued. Used only for
    /// the `Drop` diagnostic (§9d), never for dispatch decisions.
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Drains every item present at the moment of the call (a fixed-size
    /// batch, so a repost can never spin the loop on its own item) and
    /// hands each to `dispatch`. Any item `dispatch` returns is re-queued
    /// to the left, in original relative order, once the whole batch has
    /// been processed. See §4.1's "repost to the left" discipline and the
    /// note in §9 about why re-queueing is batch-bounded rather than
    /// immediate: an immediate re-pop of a reposted item with no other work
    /// ahead of it would busy-spin the loop thread until an unrelated
    /// completion re-signals the notifier, starving every other socket.
    pub fn drain_and_dispatch(&self, mut dispatch: impl FnMut(WorkItem) -> Option<WorkItem>) {
        let budget = self.inner.lock().unwrap_or_else(|e| e.into_inner()).len();
        let mut reposts = Vec::new();
        for _ in 0..budget {
            let item = self.inner.lock().unwrap_or_else(|e| e.into_inner()).pop_front();
            let Some(item) = item else { break };
            if let Some(back) = dispatch(item) {
                reposts.push(back);
            }
        }
        if !reposts.is_empty() {
            let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            for item in reposts.into_iter().rev() {
                guard.push_front(item);
            }
        }
    }
}
