// Copyright (c) 2026 fairq developers.
// All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::TryReserveError;

/// Errors surfaced by [`FairQueue`](crate::FairQueue) operations.
///
/// The queue cannot fail in any other way than running out of memory for its own bookkeeping.
/// Whether that condition is returned or turned into a process abort is decided by
/// [`AllocFailurePolicy`](crate::AllocFailurePolicy).
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("failed to allocate {what}: {source}")]
    AllocationFailed {
        what: &'static str,
        #[source]
        source: TryReserveError,
    },
}

impl QueueError {
    pub(crate) fn allocation(what: &'static str, source: TryReserveError) -> Self {
        QueueError::AllocationFailed { what, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_structure() {
        let source = Vec::<u64>::new().try_reserve(usize::MAX).unwrap_err();
        let err = QueueError::allocation("item buffer", source);
        let msg = err.to_string();
        assert!(msg.starts_with("failed to allocate item buffer"), "{msg}");
        assert!(std::error::Error::source(&err).is_some());
    }
}
