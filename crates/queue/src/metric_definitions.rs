// Copyright (c) 2026 fairq developers.
// All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

// Optional to have but adds description/help message to the metrics emitted to
// the metrics' sink.
use metrics::{Unit, describe_counter, describe_gauge};

pub const QUEUE_ENQUEUE: &str = "fairq.queue.enqueue.total";
pub const QUEUE_DEQUEUE: &str = "fairq.queue.dequeue.total";
pub const QUEUE_WAKEUPS: &str = "fairq.queue.wakeups.total";
pub const QUEUE_PENDING: &str = "fairq.queue.pending";
pub const QUEUE_WAITING: &str = "fairq.queue.waiting";

// values of label `mode` in QUEUE_DEQUEUE
pub const DEQUEUE_MODE_BLOCKING: &str = "blocking";
pub const DEQUEUE_MODE_TRY: &str = "try";
pub const DEQUEUE_MODE_DRAIN: &str = "drain";

// values of label `kind` in QUEUE_WAKEUPS
pub const WAKEUP_KIND_TARGETED: &str = "targeted";
pub const WAKEUP_KIND_BROADCAST: &str = "broadcast";

pub fn describe_metrics() {
    describe_counter!(
        QUEUE_ENQUEUE,
        Unit::Count,
        "Number of items added to the queue"
    );

    describe_counter!(
        QUEUE_DEQUEUE,
        Unit::Count,
        "Number of items handed to consumers, by dequeue mode"
    );

    describe_counter!(
        QUEUE_WAKEUPS,
        Unit::Count,
        "Number of wakeups issued to blocked consumers, by wakeup kind"
    );

    describe_gauge!(
        QUEUE_PENDING,
        Unit::Count,
        "Number of items enqueued but not yet handed to a consumer"
    );

    describe_gauge!(
        QUEUE_WAITING,
        Unit::Count,
        "Number of consumers blocked waiting for an item"
    );
}
