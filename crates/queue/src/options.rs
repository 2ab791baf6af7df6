// Copyright (c) 2026 fairq developers.
// All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use serde::{Deserialize, Serialize};

/// How a producer wakes consumers that are blocked in [`dequeue`](crate::FairQueue::dequeue).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WakeupPolicy {
    /// Wake exactly the oldest blocked consumer through its private handle and reserve the
    /// enqueued item for it. Consumers are served strictly in the order they started waiting.
    #[default]
    Targeted,
    /// Append the item and wake every blocked consumer through one shared signal. Only one of
    /// them wins the item, the rest go back to sleep. Makes no promise about which consumer wins.
    Broadcast,
}

/// What to do when the queue cannot allocate memory for its own bookkeeping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AllocFailurePolicy {
    /// Return [`QueueError::AllocationFailed`](crate::QueueError::AllocationFailed) to the caller.
    #[default]
    Error,
    /// Log the failure and abort the process.
    Abort,
}

/// # Queue options
///
/// Options are fixed for the lifetime of a queue.
#[derive(Debug, Clone, Serialize, Deserialize, derive_builder::Builder)]
#[serde(rename_all = "kebab-case", default)]
#[builder(default)]
pub struct QueueOptions {
    /// Name used to label logs and metrics of this queue.
    #[builder(setter(into))]
    pub name: String,

    /// Number of items the item buffer is sized for upfront.
    ///
    /// The buffer still grows past this on demand; there is no upper bound on queued items.
    pub initial_capacity: usize,

    /// # Wakeup policy
    ///
    /// See [`WakeupPolicy`].
    pub wakeup: WakeupPolicy,

    /// # Allocation failure policy
    ///
    /// See [`AllocFailurePolicy`].
    pub on_alloc_failure: AllocFailurePolicy,
}

impl Default for QueueOptions {
    fn default() -> Self {
        Self {
            name: "default".to_owned(),
            initial_capacity: 0,
            wakeup: WakeupPolicy::Targeted,
            on_alloc_failure: AllocFailurePolicy::Error,
        }
    }
}

impl QueueOptions {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}
