#![forbid(unsafe_code)]

//! Single-shot timer queue and time sources.
//!
//! Timers fire earliest deadline first; timers with equal deadlines fire in
//! the order they were scheduled.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;
use std::time::{Duration, SystemTime};

/// Source of wall-clock time for the event loop.
pub trait TimeSource {
    fn now(&self) -> SystemTime;
}

/// The real system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManualTime {
    now: SystemTime,
}

impl ManualTime {
    #[must_use]
    pub const fn new(start: SystemTime) -> Self {
        Self { now: start }
    }

    /// Jump to `instant`. Moving backwards is ignored.
    pub fn set(&mut self, instant: SystemTime) {
        if instant > self.now {
            self.now = instant;
        }
    }

    pub fn advance(&mut self, by: Duration) {
        self.now += by;
    }
}

impl TimeSource for ManualTime {
    fn now(&self) -> SystemTime {
        self.now
    }
}

/// Builds the message delivered when a timer fires, from the firing time.
pub type TimerCallback<M> = Box<dyn FnOnce(SystemTime) -> M>;

struct Entry<M> {
    deadline: SystemTime,
    seq: u64,
    callback: TimerCallback<M>,
}

impl<M> Entry<M> {
    fn key(&self) -> (SystemTime, u64) {
        (self.deadline, self.seq)
    }
}

impl<M> PartialEq for Entry<M> {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl<M> Eq for Entry<M> {}

impl<M> PartialOrd for Entry<M> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<M> Ord for Entry<M> {
    // Reversed so the max-heap yields the earliest deadline.
    fn cmp(&self, other: &Self) -> Ordering {
        other.key().cmp(&self.key())
    }
}

/// Pending single-shot timers.
pub struct TimerQueue<M> {
    heap: BinaryHeap<Entry<M>>,
    next_seq: u64,
}

impl<M> Default for TimerQueue<M> {
    fn default() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_seq: 0,
        }
    }
}

impl<M> fmt::Debug for TimerQueue<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerQueue")
            .field("pending", &self.heap.len())
            .field("next_deadline", &self.next_deadline())
            .finish()
    }
}

impl<M> TimerQueue<M> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, deadline: SystemTime, callback: TimerCallback<M>) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Entry {
            deadline,
            seq,
            callback,
        });
    }

    #[must_use]
    pub fn next_deadline(&self) -> Option<SystemTime> {
        self.heap.peek().map(|entry| entry.deadline)
    }

    /// Remove the earliest timer if it is due at `now`.
    pub fn pop_due(&mut self, now: SystemTime) -> Option<(SystemTime, TimerCallback<M>)> {
        if self.next_deadline()? > now {
            return None;
        }
        self.heap
            .pop()
            .map(|entry| (entry.deadline, entry.callback))
    }

    /// Time from `now` until the earliest deadline (zero if overdue).
    #[must_use]
    pub fn time_until_next(&self, now: SystemTime) -> Option<Duration> {
        self.next_deadline()
            .map(|deadline| deadline.duration_since(now).unwrap_or(Duration::ZERO))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::UNIX_EPOCH;

    fn at(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(secs)
    }

    fn label(name: &'static str) -> TimerCallback<&'static str> {
        Box::new(move |_| name)
    }

    #[test]
    fn earliest_deadline_first() {
        let mut queue = TimerQueue::new();
        queue.schedule(at(30), label("c"));
        queue.schedule(at(10), label("a"));
        queue.schedule(at(20), label("b"));

        let mut fired = Vec::new();
        while let Some((deadline, cb)) = queue.pop_due(at(100)) {
            fired.push(cb(deadline));
        }
        assert_eq!(fired, ["a", "b", "c"]);
    }

    #[test]
    fn ties_fire_in_schedule_order() {
        let mut queue = TimerQueue::new();
        for name in ["first", "second", "third"] {
            queue.schedule(at(5), label(name));
        }
        let fired: Vec<_> = std::iter::from_fn(|| queue.pop_due(at(5)))
            .map(|(d, cb)| cb(d))
            .collect();
        assert_eq!(fired, ["first", "second", "third"]);
    }

    #[test]
    fn nothing_due_before_deadline() {
        let mut queue = TimerQueue::new();
        queue.schedule(at(10), label("late"));
        assert!(queue.pop_due(at(9)).is_none());
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.time_until_next(at(7)), Some(Duration::from_secs(3)));
        assert_eq!(queue.time_until_next(at(12)), Some(Duration::ZERO));
    }

    #[test]
    fn callback_sees_firing_time() {
        let mut queue: TimerQueue<SystemTime> = TimerQueue::new();
        queue.schedule(at(1), Box::new(|fired| fired));
        let (_, cb) = queue.pop_due(at(3)).unwrap();
        assert_eq!(cb(at(3)), at(3));
    }

    #[test]
    fn manual_time_never_goes_backwards() {
        let mut time = ManualTime::new(at(10));
        time.set(at(5));
        assert_eq!(time.now(), at(10));
        time.advance(Duration::from_secs(2));
        assert_eq!(time.now(), at(12));
    }
}
