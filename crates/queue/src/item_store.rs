// Copyright (c) 2026 fairq developers.
// All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::VecDeque;

use crate::QueueError;
use crate::waiter_registry::WaiterId;

/// Pending items of a queue, in arrival order.
///
/// Items are either *unclaimed*, up for grabs by whichever consumer comes first, or *reserved*
/// for exactly one waiter that a producer already woke up. A reserved item stays here until its
/// waiter reacquires the lock and [claims](Self::claim) it, so no other consumer can take it in
/// the meantime.
///
/// Not synchronized; the owning queue keeps it behind its lock.
#[derive(Debug)]
pub(crate) struct ItemStore<T> {
    unclaimed: VecDeque<T>,
    reserved: VecDeque<(WaiterId, T)>,
    visited: u64,
}

impl<T> Default for ItemStore<T> {
    fn default() -> Self {
        Self {
            unclaimed: VecDeque::new(),
            reserved: VecDeque::new(),
            visited: 0,
        }
    }
}

impl<T> ItemStore<T> {
    pub fn with_capacity(capacity: usize) -> Result<Self, QueueError> {
        let mut store = Self::default();
        store
            .unclaimed
            .try_reserve(capacity)
            .map_err(|err| QueueError::allocation("item buffer", err))?;
        Ok(store)
    }

    /// Adds an item at the back of the unclaimed items.
    ///
    /// The item is dropped if the buffer cannot grow.
    pub fn append(&mut self, item: T) -> Result<(), QueueError> {
        self.unclaimed
            .try_reserve(1)
            .map_err(|err| QueueError::allocation("item buffer", err))?;
        self.unclaimed.push_back(item);
        Ok(())
    }

    /// Makes sure the next [`deposit`](Self::deposit) cannot allocate.
    ///
    /// Called before a waiter is taken out of the registry, so that an allocation failure leaves
    /// the waiter where it was.
    pub fn prepare_deposit(&mut self) -> Result<(), QueueError> {
        self.reserved
            .try_reserve(1)
            .map_err(|err| QueueError::allocation("reserved deposits", err))
    }

    /// Parks an item for `waiter`. Only that waiter can take it out again via [`Self::claim`].
    pub fn deposit(&mut self, waiter: WaiterId, item: T) {
        debug_assert!(
            !self.has_deposit_for(waiter),
            "waiter {waiter} already has a deposit"
        );
        self.reserved.push_back((waiter, item));
    }

    /// Takes the item deposited for `waiter`, if any.
    pub fn claim(&mut self, waiter: WaiterId) -> Option<T> {
        // Deposits are claimed mostly in the order they were made, the front is the common hit.
        let pos = self.reserved.iter().position(|(id, _)| *id == waiter)?;
        let (_, item) = self.reserved.remove(pos)?;
        self.visited += 1;
        Some(item)
    }

    pub fn has_deposit_for(&self, waiter: WaiterId) -> bool {
        self.reserved.iter().any(|(id, _)| *id == waiter)
    }

    /// Takes the oldest unclaimed item. Deposits are never handed out here.
    pub fn pop_front(&mut self) -> Option<T> {
        let item = self.unclaimed.pop_front()?;
        self.visited += 1;
        Some(item)
    }

    /// Takes all unclaimed items, oldest first. Each of them counts as visited.
    pub fn drain_unclaimed(&mut self) -> Vec<T> {
        let items: Vec<T> = self.unclaimed.drain(..).collect();
        self.visited += items.len() as u64;
        items
    }

    pub fn has_unclaimed(&self) -> bool {
        !self.unclaimed.is_empty()
    }

    /// Number of items that were enqueued but not yet handed to a consumer, deposits included.
    pub fn pending(&self) -> usize {
        self.unclaimed.len() + self.reserved.len()
    }

    /// Number of items that left the store through a consumer since it was created.
    pub fn visited(&self) -> u64 {
        self.visited
    }
}
