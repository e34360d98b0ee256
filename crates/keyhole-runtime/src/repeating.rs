#![forbid(unsafe_code)]

//! Repeating work as a chain of single-shot timers.
//!
//! A [`RepeatingTask`] maps the current time to an output and the deadline of
//! its next run. [`schedule_next`] runs the task once and returns the timer
//! command for the next run, so the chain re-arms from the time the task
//! actually ran rather than drifting by a fixed period.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::program::{Cmd, Deadline};

/// A task that decides its own next deadline.
pub trait RepeatingTask {
    type Output;

    /// Run once at `now`, returning the output and the next deadline.
    ///
    /// The deadline is always produced, even when the output reports a
    /// failure, so a chain can never stop silently.
    fn run(&mut self, now: SystemTime) -> (Self::Output, SystemTime);
}

/// Run `task` at `now` and arm the timer for its next run.
///
/// `on_fire` builds the message delivered when the next deadline passes;
/// handling that message should call `schedule_next` again.
pub fn schedule_next<T, M, F>(task: &mut T, now: SystemTime, on_fire: F) -> (T::Output, Cmd<M>)
where
    T: RepeatingTask,
    F: FnOnce(SystemTime) -> M + 'static,
{
    let (output, next) = task.run(now);
    (output, Cmd::timer(Deadline::At(next), on_fire))
}

/// The first whole-second instant strictly after `now`.
///
/// For any time between two second boundaries this is the ceiling of `now`.
/// An instant exactly on a boundary maps to the following boundary, so a
/// chain that fires on time always makes progress.
#[must_use]
pub fn next_second_boundary(now: SystemTime) -> SystemTime {
    match now.duration_since(UNIX_EPOCH) {
        Ok(since) => UNIX_EPOCH + Duration::from_secs(since.as_secs() + 1),
        Err(err) => {
            // Before the epoch: `now = EPOCH - before`.
            let before = err.duration();
            let secs = if before.subsec_nanos() == 0 {
                before.as_secs().saturating_sub(1)
            } else {
                before.as_secs()
            };
            UNIX_EPOCH - Duration::from_secs(secs)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: u64, nanos: u32) -> SystemTime {
        UNIX_EPOCH + Duration::new(secs, nanos)
    }

    #[test]
    fn rounds_up_to_next_second() {
        assert_eq!(next_second_boundary(at(100, 1)), at(101, 0));
        assert_eq!(next_second_boundary(at(100, 999_999_999)), at(101, 0));
    }

    #[test]
    fn exact_boundary_moves_forward() {
        assert_eq!(next_second_boundary(at(100, 0)), at(101, 0));
        assert_eq!(next_second_boundary(UNIX_EPOCH), at(1, 0));
    }

    #[test]
    fn before_epoch() {
        let t = UNIX_EPOCH - Duration::new(2, 500_000_000);
        assert_eq!(next_second_boundary(t), UNIX_EPOCH - Duration::from_secs(2));
        let t = UNIX_EPOCH - Duration::from_secs(3);
        assert_eq!(next_second_boundary(t), UNIX_EPOCH - Duration::from_secs(2));
        let t = UNIX_EPOCH - Duration::from_secs(1);
        assert_eq!(next_second_boundary(t), UNIX_EPOCH);
    }

    struct Counter(u32);

    impl RepeatingTask for Counter {
        type Output = u32;

        fn run(&mut self, now: SystemTime) -> (u32, SystemTime) {
            self.0 += 1;
            (self.0, next_second_boundary(now))
        }
    }

    #[test]
    fn schedule_next_arms_timer_at_task_deadline() {
        let mut task = Counter(0);
        let (out, cmd) = schedule_next(&mut task, at(7, 250), |fired| fired);
        assert_eq!(out, 1);
        match cmd {
            Cmd::Timer(Deadline::At(deadline), build) => {
                assert_eq!(deadline, at(8, 0));
                assert_eq!(build(at(8, 3)), at(8, 3));
            }
            other => panic!("expected timer, got {other:?}"),
        }
    }
}
