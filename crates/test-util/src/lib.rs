// Copyright (c) 2026 fairq developers.
// All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Useful test utilities for fairq crates. Import them with:
//!
//! ```rust
//! use fairq_test_util::{assert, assert_eq, assert_ne, wait_until};
//! ```
//!
//! Note: You cannot import them with a glob import, as the compiler won't be able to distinguish our imports and the stdlib imports.

use std::time::{Duration, Instant};

/// How long [`wait_until`] polls before giving up.
pub const WAIT_UNTIL_TIMEOUT: Duration = Duration::from_secs(10);

/// How long [`assert_still_blocked`] gives a thread to finish before declaring it blocked.
pub const BLOCKED_GRACE_PERIOD: Duration = Duration::from_millis(100);

/// Polls `condition` until it holds. Panics with `what` if it does not within
/// [`WAIT_UNTIL_TIMEOUT`].
///
/// Meant for waiting until other threads reached a known state, e.g. until a number of
/// consumers are blocked on a queue.
pub fn wait_until(what: &str, mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + WAIT_UNTIL_TIMEOUT;
    while !condition() {
        if Instant::now() >= deadline {
            panic!("timed out after {WAIT_UNTIL_TIMEOUT:?} waiting until {what}");
        }
        std::thread::sleep(Duration::from_millis(1));
    }
}

/// Macro to assert a thread has not finished yet.
///
/// Works with both `std::thread::JoinHandle` and `std::thread::ScopedJoinHandle`.
///
/// Note: this check is based on a grace period, hence based on the context it might not be enough
/// to use this assert to prove that the thread is blocked forever.
#[macro_export]
macro_rules! assert_still_blocked {
    ($handle:expr) => {
        std::thread::sleep($crate::BLOCKED_GRACE_PERIOD);
        assert!(
            !$handle.is_finished(),
            "{} finished although it should still be blocked",
            stringify!($handle)
        );
    };
}

// A couple of useful re-exports
pub use assert2::{assert, check, let_assert};
pub use pretty_assertions::{assert_eq, assert_ne};
