// Copyright (c) 2026 fairq developers.
// All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::thread;

use googletest::prelude::*;

use fairq_queue::{FairQueue, QueueOptions, QueueStats, WakeupPolicy};
use fairq_test_util::{assert_eq, wait_until};

/// Spawns `count` consumers one after the other, making sure each of them is blocked in
/// `dequeue` before the next one starts. Consumer `j` is thus the `j`th to begin waiting.
fn spawn_ordered_consumers<'scope, T: Send + 'scope>(
    s: &'scope thread::Scope<'scope, '_>,
    queue: &'scope FairQueue<T>,
    count: usize,
) -> Vec<thread::ScopedJoinHandle<'scope, T>> {
    (0..count)
        .map(|j| {
            let handle = s.spawn(move || queue.dequeue().unwrap());
            wait_until(&format!("consumer {j} is waiting"), || {
                queue.waiting() == j + 1
            });
            handle
        })
        .collect()
}

#[test_log::test]
fn three_waiters_receive_items_in_waiting_order() {
    let queue = FairQueue::new();

    let received: Vec<&str> = thread::scope(|s| {
        let consumers = spawn_ordered_consumers(s, &queue, 3);
        assert_that!(queue.waiting(), eq(3));

        queue.enqueue("a").unwrap();
        queue.enqueue("b").unwrap();
        queue.enqueue("c").unwrap();

        consumers
            .into_iter()
            .map(|consumer| consumer.join().unwrap())
            .collect()
    });

    assert_that!(received, elements_are![eq(&"a"), eq(&"b"), eq(&"c")]);
    assert_that!(
        queue.stats(),
        eq(QueueStats {
            size: 0,
            waiting: 0,
            visited: 3
        })
    );
}

#[test_log::test]
fn every_waiter_gets_exactly_its_item() {
    const WAITERS: usize = 16;
    let queue = FairQueue::new();

    let received: Vec<usize> = thread::scope(|s| {
        let consumers = spawn_ordered_consumers(s, &queue, WAITERS);
        for item in 0..WAITERS {
            queue.enqueue(item).unwrap();
        }
        consumers
            .into_iter()
            .map(|consumer| consumer.join().unwrap())
            .collect()
    });

    assert_eq!(received, (0..WAITERS).collect::<Vec<_>>());
    assert_that!(queue.waiting(), eq(0));
    assert_that!(queue.size(), eq(0));
    assert_that!(queue.visited(), eq(WAITERS as u64));
}

#[test_log::test]
fn batch_enqueue_serves_waiters_oldest_first() {
    let queue = FairQueue::new();

    let received: Vec<u32> = thread::scope(|s| {
        let consumers = spawn_ordered_consumers(s, &queue, 4);
        // two more than there are waiters, the rest stays queued
        assert_eq!(queue.enqueue_all([10, 11, 12, 13, 14, 15]).unwrap(), 6);
        consumers
            .into_iter()
            .map(|consumer| consumer.join().unwrap())
            .collect()
    });

    assert_that!(received, elements_are![eq(&10), eq(&11), eq(&12), eq(&13)]);
    assert_that!(queue.drain(), elements_are![eq(&14), eq(&15)]);
    assert_that!(queue.visited(), eq(6));
}

#[test_log::test]
fn late_consumer_queues_behind_earlier_waiters() {
    let queue = FairQueue::new();

    let (early, late) = thread::scope(|s| {
        let early = spawn_ordered_consumers(s, &queue, 2);
        queue.enqueue(1).unwrap();
        // a third consumer arrives after the first item was handed out
        let late = s.spawn(|| queue.dequeue().unwrap());
        wait_until("late consumer is waiting", || queue.waiting() == 2);

        queue.enqueue(2).unwrap();
        queue.enqueue(3).unwrap();

        let early: Vec<i32> = early
            .into_iter()
            .map(|consumer| consumer.join().unwrap())
            .collect();
        (early, late.join().unwrap())
    });

    assert_that!(early, elements_are![eq(&1), eq(&2)]);
    assert_that!(late, eq(3));
}

fn run_mpmc(wakeup: WakeupPolicy) {
    const PRODUCERS: usize = 4;
    const CONSUMERS: usize = 4;
    const PER_PRODUCER: usize = 2_000;

    let queue = FairQueue::with_options(QueueOptions {
        wakeup,
        ..QueueOptions::named("mpmc")
    });
    let queue = &queue;

    let per_consumer: Vec<Vec<(usize, usize)>> = thread::scope(|s| {
        for producer in 0..PRODUCERS {
            s.spawn(move || {
                for seq in 0..PER_PRODUCER {
                    queue.enqueue((producer, seq)).unwrap();
                }
            });
        }
        let consumers: Vec<_> = (0..CONSUMERS)
            .map(|_| {
                s.spawn(move || {
                    (0..PRODUCERS * PER_PRODUCER / CONSUMERS)
                        .map(|_| queue.dequeue().unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        consumers
            .into_iter()
            .map(|consumer| consumer.join().unwrap())
            .collect()
    });

    // Every consumer sees each producer's items in production order.
    for received in &per_consumer {
        for producer in 0..PRODUCERS {
            let seqs: Vec<usize> = received
                .iter()
                .filter(|(p, _)| *p == producer)
                .map(|(_, seq)| *seq)
                .collect();
            assert_that!(seqs.is_sorted(), eq(true));
        }
    }

    // And every item is delivered exactly once.
    let mut all: Vec<(usize, usize)> = per_consumer.into_iter().flatten().collect();
    all.sort_unstable();
    let expected: Vec<(usize, usize)> = (0..PRODUCERS)
        .flat_map(|producer| (0..PER_PRODUCER).map(move |seq| (producer, seq)))
        .collect();
    assert_eq!(all, expected);

    assert_that!(
        queue.stats(),
        eq(QueueStats {
            size: 0,
            waiting: 0,
            visited: (PRODUCERS * PER_PRODUCER) as u64
        })
    );
}

#[test_log::test]
fn mpmc_targeted_delivers_every_item_once() {
    run_mpmc(WakeupPolicy::Targeted);
}

#[test_log::test]
fn mpmc_broadcast_delivers_every_item_once() {
    run_mpmc(WakeupPolicy::Broadcast);
}

#[test_log::test]
fn mixed_blocking_and_try_consumers_account_every_item() {
    const ITEMS: usize = 5_000;
    let queue = FairQueue::new();
    let queue = &queue;

    let (blocking, tried) = thread::scope(|s| {
        let producer = s.spawn(move || {
            for item in 0..ITEMS {
                queue.enqueue(item).unwrap();
            }
        });
        let poller = s.spawn(move || {
            let mut tried = Vec::new();
            while !producer.is_finished() || !queue.is_empty() {
                if let Some(item) = queue.try_dequeue() {
                    tried.push(item);
                }
                if tried.len() >= ITEMS / 2 {
                    break;
                }
            }
            tried
        });
        let tried = poller.join().unwrap();
        let blocking: Vec<usize> = (tried.len()..ITEMS)
            .map(|_| queue.dequeue().unwrap())
            .collect();
        (blocking, tried)
    });

    assert_that!(tried.is_sorted(), eq(true));
    assert_that!(blocking.is_sorted(), eq(true));
    assert_that!(blocking.len() + tried.len(), eq(ITEMS));
    assert_that!(queue.visited(), eq(ITEMS as u64));
    assert_that!(queue.size(), eq(0));
}
