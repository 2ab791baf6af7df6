// Copyright (c) 2026 fairq developers.
// All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! A fair, unbounded FIFO blocking queue for handing work from producer threads to consumer
//! threads.
//!
//! # Ordering
//!
//! | What | Guarantee |
//! |------|-----------|
//! | Items | Delivered in the order they were enqueued. |
//! | Blocked consumers | Served in the order they started waiting. |
//!
//! Consumers that find the queue empty register in a waiter registry and block on a private
//! wake handle. An [`enqueue`](FairQueue::enqueue) takes the oldest registered consumer out of
//! the registry, sets the item aside for it and wakes only that consumer. Nobody else can take
//! the item in the meantime, neither a newly arriving consumer nor
//! [`try_dequeue`](FairQueue::try_dequeue). Consumer order is thus decided by the registry, not
//! by the scheduling of the underlying condition variable, and no wakeup is wasted on consumers
//! that cannot make progress.
//!
//! [`WakeupPolicy::Broadcast`] switches to the textbook alternative: one shared condition
//! variable that wakes every blocked consumer on each enqueue.
//!
//! # Example
//!
//! ```
//! use std::thread;
//!
//! use fairq_queue::FairQueue;
//!
//! let queue = FairQueue::new();
//!
//! thread::scope(|s| {
//!     let consumer = s.spawn(|| queue.dequeue().unwrap());
//!     queue.enqueue("work").unwrap();
//!     assert_eq!(consumer.join().unwrap(), "work");
//! });
//!
//! assert_eq!(queue.visited(), 1);
//! ```

mod error;
mod item_store;
pub mod metric_definitions;
mod options;
mod queue;
mod waiter_registry;

pub use error::QueueError;
pub use options::{AllocFailurePolicy, QueueOptions, QueueOptionsBuilder, WakeupPolicy};
pub use queue::{FairQueue, QueueStats};
