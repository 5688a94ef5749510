//! Cooperative timer queue
//!
//! Continuations are keyed by due time and scheduling order; nothing runs
//! until the owner pops it during a pump.

use std::collections::BTreeMap;
use std::time::Duration;

/// Handle to a scheduled continuation, used for cancellation
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId {
    due: Duration,
    seq: u64,
}

impl TimerId {
    pub fn due(&self) -> Duration {
        self.due
    }
}

/// Queue of continuations waiting for their due time
#[derive(Debug)]
pub struct Scheduler<T> {
    timers: BTreeMap<TimerId, T>,
    next_seq: u64,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self {
            timers: BTreeMap::new(),
            next_seq: 0,
        }
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `task` to run `delay` after `now`
    pub fn schedule(&mut self, now: Duration, delay: Duration, task: T) -> TimerId {
        let id = TimerId {
            due: now + delay,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.timers.insert(id, task);
        id
    }

    /// Cancel a pending continuation, returning it if it had not run yet
    pub fn cancel(&mut self, id: TimerId) -> Option<T> {
        self.timers.remove(&id)
    }

    /// Pop the earliest continuation whose due time has passed
    pub fn pop_due(&mut self, now: Duration) -> Option<(TimerId, T)> {
        let (id, _) = self.timers.first_key_value()?;
        if id.due > now {
            return None;
        }
        self.timers.pop_first()
    }

    /// Due time of the earliest pending continuation
    pub fn next_due(&self) -> Option<Duration> {
        self.timers.keys().next().map(|id| id.due)
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }
}
