// Copyright (c) 2026 fairq developers.
// All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::fmt;
use std::sync::{Arc, Once};

use metrics::{Counter, Gauge, counter, gauge};
use parking_lot::{Condvar, Mutex, MutexGuard};
use tracing::{debug, error, trace, warn};

use crate::item_store::ItemStore;
use crate::metric_definitions::{
    DEQUEUE_MODE_BLOCKING, DEQUEUE_MODE_DRAIN, DEQUEUE_MODE_TRY, QUEUE_DEQUEUE, QUEUE_ENQUEUE,
    QUEUE_PENDING, QUEUE_WAITING, QUEUE_WAKEUPS, WAKEUP_KIND_BROADCAST, WAKEUP_KIND_TARGETED,
    describe_metrics,
};
use crate::waiter_registry::WaiterRegistry;
use crate::{AllocFailurePolicy, QueueError, QueueOptions, WakeupPolicy};

static DESCRIBE_METRICS: Once = Once::new();

/// Point-in-time view of a queue's counters, read under a single lock acquisition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// Items enqueued but not yet handed to a consumer.
    pub size: usize,
    /// Consumers currently blocked in [`FairQueue::dequeue`].
    pub waiting: usize,
    /// Items handed to consumers since the queue was created.
    pub visited: u64,
}

/// An unbounded FIFO queue that hands items from producer threads to consumer threads.
///
/// Items are delivered in the order they were enqueued. Consumers that block in
/// [`dequeue`](Self::dequeue) on an empty queue are served in the order they started waiting:
/// every [`enqueue`](Self::enqueue) wakes exactly the oldest of them and sets the item aside for
/// it (with the default [`WakeupPolicy::Targeted`]).
///
/// Cheaply cloneable, all clones share the same queue. The queue and its remaining items are
/// dropped together with the last clone. A blocked consumer holds either a clone or a borrow,
/// so the queue can never go away underneath it.
pub struct FairQueue<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for FairQueue<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for FairQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for FairQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("FairQueue");
        debug.field("name", &self.inner.options.name);
        debug.field("wakeup", &self.inner.options.wakeup);
        if let Some(state) = self.inner.state.try_lock() {
            debug.field("stats", &state.stats());
        }
        debug.finish_non_exhaustive()
    }
}

impl<T> FairQueue<T> {
    pub fn new() -> Self {
        Self::with_options(QueueOptions::default())
    }

    /// Creates a queue with the given options.
    ///
    /// If the item buffer cannot be sized for `initial_capacity` upfront, the queue starts with
    /// an empty buffer instead. Use [`try_with_options`](Self::try_with_options) to fail instead.
    pub fn with_options(options: QueueOptions) -> Self {
        let items = match ItemStore::with_capacity(options.initial_capacity) {
            Ok(items) => items,
            Err(err) => {
                warn!(
                    queue = %options.name,
                    initial_capacity = options.initial_capacity,
                    "Could not pre-allocate the item buffer, starting with an empty one: {err}"
                );
                ItemStore::default()
            }
        };
        Self::from_parts(options, items)
    }

    pub fn try_with_options(options: QueueOptions) -> Result<Self, QueueError> {
        let items = ItemStore::with_capacity(options.initial_capacity)?;
        Ok(Self::from_parts(options, items))
    }

    fn from_parts(options: QueueOptions, items: ItemStore<T>) -> Self {
        DESCRIBE_METRICS.call_once(describe_metrics);
        debug!(queue = %options.name, wakeup = ?options.wakeup, "Created queue");

        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State {
                    items,
                    waiters: WaiterRegistry::default(),
                }),
                not_empty: Condvar::new(),
                metrics: QueueMetrics::new(&options.name),
                options,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.options.name
    }

    pub fn options(&self) -> &QueueOptions {
        &self.inner.options
    }

    /// Adds an item at the back of the queue. Never blocks.
    ///
    /// If a consumer is blocked in [`dequeue`](Self::dequeue), the oldest one receives this item.
    ///
    /// Fails only if the queue cannot grow its bookkeeping, in which case the item is dropped.
    pub fn enqueue(&self, item: T) -> Result<(), QueueError> {
        let mut state = self.inner.state.lock();
        let result = self.inner.push(&mut state, item);
        self.inner.update_gauges(&state);
        drop(state);

        result.map_err(|err| self.inner.alloc_failed(err))
    }

    /// Adds all items in one critical section, preserving their order. Returns how many were
    /// added.
    ///
    /// Blocked consumers are served oldest first, one item each, before anything is left in the
    /// queue. On failure, the items before the failing one stay enqueued and the rest is dropped.
    pub fn enqueue_all(&self, items: impl IntoIterator<Item = T>) -> Result<usize, QueueError> {
        // collected upfront so that no caller code runs while the lock is held
        let items: Vec<T> = items.into_iter().collect();

        let mut state = self.inner.state.lock();
        let mut added = 0;
        let mut result = Ok(());
        for item in items {
            if let Err(err) = self.inner.push(&mut state, item) {
                result = Err(err);
                break;
            }
            added += 1;
        }
        self.inner.update_gauges(&state);
        drop(state);

        result
            .map(|()| added)
            .map_err(|err| self.inner.alloc_failed(err))
    }

    /// Removes the item at the front of the queue, blocking until one is available.
    ///
    /// There is no timeout. The call returns once an [`enqueue`](Self::enqueue) served this
    /// consumer. Fails only if this consumer cannot be registered as a waiter.
    pub fn dequeue(&self) -> Result<T, QueueError> {
        let mut state = self.inner.state.lock();
        let result = match state.items.pop_front() {
            Some(item) => Ok(item),
            None => match self.inner.options.wakeup {
                WakeupPolicy::Targeted => self.inner.wait_targeted(&mut state),
                WakeupPolicy::Broadcast => self.inner.wait_broadcast(&mut state),
            },
        };
        self.inner.update_gauges(&state);
        drop(state);

        match result {
            Ok(item) => {
                self.inner.metrics.dequeued_blocking.increment(1);
                Ok(item)
            }
            Err(err) => Err(self.inner.alloc_failed(err)),
        }
    }

    /// Removes the item at the front of the queue if there is one. Never blocks.
    ///
    /// Items already set aside for a woken consumer are not available here, so this may return
    /// `None` while [`size`](Self::size) is still non-zero.
    pub fn try_dequeue(&self) -> Option<T> {
        let mut state = self.inner.state.lock();
        let item = state.items.pop_front()?;
        self.inner.update_gauges(&state);
        drop(state);

        self.inner.metrics.dequeued_try.increment(1);
        Some(item)
    }

    /// Removes every item that is not set aside for a woken consumer, oldest first.
    ///
    /// Drained items count as [`visited`](Self::visited).
    pub fn drain(&self) -> Vec<T> {
        let mut state = self.inner.state.lock();
        let items = state.items.drain_unclaimed();
        self.inner.update_gauges(&state);
        drop(state);

        if !items.is_empty() {
            debug!(queue = %self.inner.options.name, drained = items.len(), "Drained queue");
            self.inner.metrics.dequeued_drain.increment(items.len() as u64);
        }
        items
    }

    /// Items enqueued but not yet handed to a consumer.
    pub fn size(&self) -> usize {
        self.inner.state.lock().items.pending()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Consumers currently blocked in [`dequeue`](Self::dequeue).
    pub fn waiting(&self) -> usize {
        self.inner.state.lock().waiters.len()
    }

    /// Items handed to consumers since the queue was created. Never decreases.
    pub fn visited(&self) -> u64 {
        self.inner.state.lock().items.visited()
    }

    pub fn stats(&self) -> QueueStats {
        self.inner.state.lock().stats()
    }
}

struct State<T> {
    items: ItemStore<T>,
    waiters: WaiterRegistry,
}

impl<T> State<T> {
    fn stats(&self) -> QueueStats {
        QueueStats {
            size: self.items.pending(),
            waiting: self.waiters.len(),
            visited: self.items.visited(),
        }
    }
}

struct Inner<T> {
    state: Mutex<State<T>>,
    /// Store-wide signal, only waited on under [`WakeupPolicy::Broadcast`].
    not_empty: Condvar,
    metrics: QueueMetrics,
    options: QueueOptions,
}

impl<T> Inner<T> {
    fn push(&self, state: &mut State<T>, item: T) -> Result<(), QueueError> {
        match self.options.wakeup {
            WakeupPolicy::Targeted => self.hand_off_or_append(state, item)?,
            WakeupPolicy::Broadcast => self.append_and_broadcast(state, item)?,
        }
        self.metrics.enqueued.increment(1);
        Ok(())
    }

    fn hand_off_or_append(&self, state: &mut State<T>, item: T) -> Result<(), QueueError> {
        if !state.waiters.is_empty() {
            state.items.prepare_deposit()?;
        }

        match state.waiters.pop_oldest() {
            Some((waiter, handle)) => {
                state.items.deposit(waiter, item);
                if let Some(handle) = handle {
                    handle.notify_one();
                }
                self.metrics.wakeups_targeted.increment(1);
                trace!(queue = %self.options.name, %waiter, "Handed item to oldest waiter");
            }
            None => state.items.append(item)?,
        }
        Ok(())
    }

    fn append_and_broadcast(&self, state: &mut State<T>, item: T) -> Result<(), QueueError> {
        state.items.append(item)?;

        if !state.waiters.is_empty() {
            self.metrics
                .wakeups_broadcast
                .increment(state.waiters.len() as u64);
            trace!(
                queue = %self.options.name,
                waiting = state.waiters.len(),
                "Waking all waiters"
            );
        }
        self.not_empty.notify_all();
        Ok(())
    }

    /// Blocks on a private wake handle until a producer deposits an item for this waiter.
    ///
    /// Must be called with an empty item store.
    fn wait_targeted(&self, state: &mut MutexGuard<'_, State<T>>) -> Result<T, QueueError> {
        debug_assert!(!state.items.has_unclaimed());

        let (waiter, handle) = state.waiters.register()?;
        self.update_gauges(state);
        trace!(queue = %self.options.name, %waiter, "Waiting for an item");

        loop {
            handle.wait(state);

            if let Some(item) = state.items.claim(waiter) {
                state.waiters.recycle(handle);
                trace!(queue = %self.options.name, %waiter, "Claimed deposited item");
                return Ok(item);
            }

            // Woken without a deposit. The waiter is still linked at its original position.
            debug_assert!(state.waiters.contains(waiter));
        }
    }

    /// Blocks on the store-wide signal, competing with every other waiter for the next item.
    fn wait_broadcast(&self, state: &mut MutexGuard<'_, State<T>>) -> Result<T, QueueError> {
        loop {
            let waiter = state.waiters.register_position()?;
            self.update_gauges(state);
            trace!(queue = %self.options.name, %waiter, "Waiting for an item");

            self.not_empty.wait(state);

            state.waiters.remove(waiter);
            if let Some(item) = state.items.pop_front() {
                return Ok(item);
            }
            trace!(queue = %self.options.name, %waiter, "Lost the item to another consumer");
        }
    }

    fn alloc_failed(&self, err: QueueError) -> QueueError {
        if self.options.on_alloc_failure == AllocFailurePolicy::Abort {
            error!(queue = %self.options.name, "Aborting: {err}");
            std::process::abort();
        }
        err
    }

    fn update_gauges(&self, state: &State<T>) {
        self.metrics.pending.set(state.items.pending() as f64);
        self.metrics.waiting.set(state.waiters.len() as f64);
    }
}

impl<T> Drop for Inner<T> {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        debug_assert!(
            state.waiters.is_empty(),
            "queue dropped while consumers are blocked on it"
        );

        let leftover = state.items.pending();
        if leftover > 0 {
            warn!(
                queue = %self.options.name,
                leftover,
                "Dropping queue with items that were never dequeued"
            );
        }
    }
}

struct QueueMetrics {
    enqueued: Counter,
    dequeued_blocking: Counter,
    dequeued_try: Counter,
    dequeued_drain: Counter,
    wakeups_targeted: Counter,
    wakeups_broadcast: Counter,
    pending: Gauge,
    waiting: Gauge,
}

impl QueueMetrics {
    fn new(name: &str) -> Self {
        let queue = name.to_owned();
        Self {
            enqueued: counter!(QUEUE_ENQUEUE, "queue" => queue.clone()),
            dequeued_blocking: counter!(QUEUE_DEQUEUE, "queue" => queue.clone(), "mode" => DEQUEUE_MODE_BLOCKING),
            dequeued_try: counter!(QUEUE_DEQUEUE, "queue" => queue.clone(), "mode" => DEQUEUE_MODE_TRY),
            dequeued_drain: counter!(QUEUE_DEQUEUE, "queue" => queue.clone(), "mode" => DEQUEUE_MODE_DRAIN),
            wakeups_targeted: counter!(QUEUE_WAKEUPS, "queue" => queue.clone(), "kind" => WAKEUP_KIND_TARGETED),
            wakeups_broadcast: counter!(QUEUE_WAKEUPS, "queue" => queue.clone(), "kind" => WAKEUP_KIND_BROADCAST),
            pending: gauge!(QUEUE_PENDING, "queue" => queue.clone()),
            waiting: gauge!(QUEUE_WAITING, "queue" => queue),
        }
    }
}
