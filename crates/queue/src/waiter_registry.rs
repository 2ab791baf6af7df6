// Copyright (c) 2026 fairq developers.
// All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Consumers blocked on an empty queue, in the order they started waiting.
//!
//! Every waiter owns a private wake handle. A producer wakes exactly the waiter it takes out of
//! the registry, which is always the oldest one. Ordering therefore never depends on how the
//! underlying condition variable picks threads to wake.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use parking_lot::Condvar;

use crate::QueueError;

/// Upper bound of idle wake handles kept around for reuse.
const MAX_SPARE_HANDLES: usize = 64;

/// Identifies one blocked `dequeue` call. Ids are handed out in registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct WaiterId(u64);

impl fmt::Display for WaiterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "w{}", self.0)
    }
}

/// Private wakeup signal of a single waiter.
///
/// Only ever waited on together with the lock of the queue that created it.
pub(crate) type WakeHandle = Arc<Condvar>;

#[derive(Debug)]
struct Waiter {
    id: WaiterId,
    /// `None` for waiters that sleep on a signal shared by the whole queue.
    handle: Option<WakeHandle>,
}

#[derive(Debug, Default)]
pub(crate) struct WaiterRegistry {
    waiters: VecDeque<Waiter>,
    next_id: u64,
    spare_handles: Vec<WakeHandle>,
}

impl WaiterRegistry {
    /// Links a new waiter with a private wake handle behind all existing ones.
    pub fn register(&mut self) -> Result<(WaiterId, WakeHandle), QueueError> {
        self.waiters
            .try_reserve(1)
            .map_err(|err| QueueError::allocation("waiter registry", err))?;

        let handle = self
            .spare_handles
            .pop()
            .unwrap_or_else(|| Arc::new(Condvar::new()));
        let id = self.link(Some(Arc::clone(&handle)));
        Ok((id, handle))
    }

    /// Links a new waiter that only needs a place in line, not a wake handle of its own.
    pub fn register_position(&mut self) -> Result<WaiterId, QueueError> {
        self.waiters
            .try_reserve(1)
            .map_err(|err| QueueError::allocation("waiter registry", err))?;

        Ok(self.link(None))
    }

    fn link(&mut self, handle: Option<WakeHandle>) -> WaiterId {
        let id = WaiterId(self.next_id);
        self.next_id += 1;
        self.waiters.push_back(Waiter { id, handle });
        id
    }

    /// Unlinks the waiter that has been waiting the longest.
    ///
    /// The wake handle is `None` if the waiter was linked with
    /// [`register_position`](Self::register_position).
    pub fn pop_oldest(&mut self) -> Option<(WaiterId, Option<WakeHandle>)> {
        self.waiters
            .pop_front()
            .map(|waiter| (waiter.id, waiter.handle))
    }

    /// Unlinks `id` wherever it sits, keeping the order of everybody else. Its wake handle, if
    /// any, goes back to the spares.
    ///
    /// Returns `false` if the waiter was already unlinked.
    pub fn remove(&mut self, id: WaiterId) -> bool {
        let Some(pos) = self.waiters.iter().position(|waiter| waiter.id == id) else {
            return false;
        };
        if let Some(handle) = self.waiters.remove(pos).and_then(|waiter| waiter.handle) {
            self.recycle(handle);
        }
        true
    }

    pub fn contains(&self, id: WaiterId) -> bool {
        self.waiters.iter().any(|waiter| waiter.id == id)
    }

    /// Hands back a wake handle whose waiter is done.
    ///
    /// Handles that are still shared, or that exceed the spare limit, are simply dropped.
    pub fn recycle(&mut self, handle: WakeHandle) {
        if Arc::strong_count(&handle) == 1 && self.spare_handles.len() < MAX_SPARE_HANDLES {
            self.spare_handles.push(handle);
        }
    }

    pub fn len(&self) -> usize {
        self.waiters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waiters.is_empty()
    }

    /// Signals every linked waiter without giving it anything.
    #[cfg(test)]
    pub fn wake_all_spuriously(&self) {
        for handle in self.waiters.iter().filter_map(|waiter| waiter.handle.as_ref()) {
            handle.notify_one();
        }
    }
}
