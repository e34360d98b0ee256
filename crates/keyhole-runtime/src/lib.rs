#![forbid(unsafe_code)]

//! Runtime: the cooperative event loop that drives a [`Model`].
//!
//! Everything a model sees arrives through `update` on one thread: terminal
//! input, events pushed by background producers through an [`EventSender`],
//! and single-shot timers requested with [`Cmd::Timer`]. Repeating work is
//! expressed as a chain of single-shot timers (see [`repeating`]).

pub mod event_source;
pub mod program;
pub mod repeating;
pub mod simulator;
pub mod timer;

pub use event_source::{CrosstermEventSource, EventSource, HeadlessEventSource};
pub use program::{
    Cmd, Deadline, EventInbox, EventSender, Model, Program, ProgramConfig, event_channel,
};
pub use repeating::{RepeatingTask, next_second_boundary, schedule_next};
pub use simulator::ProgramSimulator;
pub use timer::{ManualTime, SystemTimeSource, TimeSource, TimerQueue};
