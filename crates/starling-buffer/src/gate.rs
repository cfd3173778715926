//! Blocking gate for bounded buffers.
//!
//! A condition variable paired with the buffer's own mutex: the
//! occupancy check, the wait and the signal all happen under one
//! lock, so a producer can never miss the wakeup that follows the
//! slot-freeing it is waiting for. Waits loop on the caller's
//! condition, which makes spurious wakeups harmless.
//!
//! The gate carries no deadline: timeout and retry policy belong to
//! the reliability protocol above the buffer. The only way to abort a
//! blocked producer is `close()` on the buffer, which flips the open
//! flag and wakes everyone.

use std::sync::{Condvar, MutexGuard, PoisonError};

pub(crate) struct Gate {
    not_full: Condvar,
}

impl Gate {
    pub fn new() -> Self {
        Gate {
            not_full: Condvar::new(),
        }
    }

    /// Blocks while `blocked(&state)` holds, re-acquiring the lock on
    /// every wakeup and re-checking. Returns the guard so the caller
    /// continues under the same critical section it started in.
    pub fn wait_while<'a, S, F>(
        &self,
        mut guard: MutexGuard<'a, S>,
        mut blocked: F,
    ) -> MutexGuard<'a, S>
    where
        F: FnMut(&S) -> bool,
    {
        while blocked(&guard) {
            guard = self
                .not_full
                .wait(guard)
                .unwrap_or_else(PoisonError::into_inner);
        }
        guard
    }

    /// Wakes every blocked producer; each re-checks its condition.
    pub fn notify_all(&self) {
        self.not_full.notify_all();
    }
}
