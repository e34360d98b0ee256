#![forbid(unsafe_code)]

//! Deterministic program simulator for testing.
//!
//! `ProgramSimulator` runs a [`Model`] without a terminal and with a manual
//! clock. Events can be injected, messages sent directly, simulated time
//! advanced (firing timers exactly at their deadlines), and frames captured.
//!
//! # Example
//!
//! ```ignore
//! let mut sim = ProgramSimulator::new(model, start);
//! sim.init();
//! sim.advance(Duration::from_secs(5));
//! let buf = sim.capture_frame(80, 24);
//! ```

use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, SystemTime};

use keyhole_core::event::Event;
use keyhole_render::Buffer;

use crate::program::{Cmd, EventSender, Model};
use crate::timer::{ManualTime, TimeSource, TimerQueue};

/// Deterministic simulator for [`Model`] testing.
pub struct ProgramSimulator<M: Model> {
    model: M,
    clock: ManualTime,
    timers: TimerQueue<M::Message>,
    sender: EventSender,
    inbox: Receiver<Event>,
    frames: Vec<Buffer>,
    running: bool,
    redraws: usize,
}

impl<M: Model> ProgramSimulator<M> {
    /// Create a simulator whose clock starts at `start`.
    ///
    /// The model is not initialized until [`init`](Self::init) is called.
    pub fn new(model: M, start: SystemTime) -> Self {
        let (sender, inbox) = mpsc::channel();
        Self {
            model,
            clock: ManualTime::new(start),
            timers: TimerQueue::new(),
            sender,
            inbox,
            frames: Vec::new(),
            running: true,
            redraws: 0,
        }
    }

    /// Call `Model::init()` and execute the returned commands.
    pub fn init(&mut self) {
        let cmd = self.model.init();
        self.execute_cmd(cmd);
    }

    /// Inject events through `From<Event>`, stopping once the model quits.
    pub fn inject_events(&mut self, events: &[Event]) {
        for event in events {
            if !self.running {
                break;
            }
            self.send(M::Message::from(event.clone()));
        }
    }

    pub fn inject_event(&mut self, event: Event) {
        self.inject_events(&[event]);
    }

    /// Dispatch a message through `Model::update()`.
    pub fn send(&mut self, msg: M::Message) {
        if !self.running {
            return;
        }
        let cmd = self.model.update(msg);
        self.execute_cmd(cmd);
    }

    /// A sender for background producers, drained by [`pump`](Self::pump).
    #[must_use]
    pub fn event_sender(&self) -> EventSender {
        self.sender.clone()
    }

    /// Deliver everything currently queued on the event channel.
    pub fn pump(&mut self) {
        while self.running {
            let Ok(event) = self.inbox.try_recv() else {
                break;
            };
            self.send(M::Message::from(event));
        }
    }

    /// Advance simulated time by `by`, firing due timers in deadline order.
    ///
    /// The clock is set to each timer's deadline before it fires, so callbacks
    /// observe exactly the instant they were scheduled for.
    pub fn advance(&mut self, by: Duration) {
        let target = self.clock.now() + by;
        self.pump();
        while self.running {
            match self.timers.next_deadline() {
                Some(deadline) if deadline <= target => {
                    self.clock.set(deadline);
                    if let Some((_, on_fire)) = self.timers.pop_due(deadline) {
                        self.send(on_fire(self.clock.now()));
                    }
                }
                _ => break,
            }
        }
        self.clock.set(target);
    }

    /// Render the model into a fresh buffer and keep it.
    pub fn capture_frame(&mut self, width: u16, height: u16) -> &Buffer {
        let mut buffer = Buffer::new(width, height);
        self.model.view(&mut buffer);
        self.frames.push(buffer);
        &self.frames[self.frames.len() - 1]
    }

    #[must_use]
    pub fn frames(&self) -> &[Buffer] {
        &self.frames
    }

    #[must_use]
    pub fn last_frame(&self) -> Option<&Buffer> {
        self.frames.last()
    }

    #[must_use]
    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }

    /// Current simulated time.
    #[must_use]
    pub fn now(&self) -> SystemTime {
        self.clock.now()
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// How many `Cmd::Redraw` commands were executed.
    #[must_use]
    pub fn redraw_count(&self) -> usize {
        self.redraws
    }

    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    #[must_use]
    pub fn next_deadline(&self) -> Option<SystemTime> {
        self.timers.next_deadline()
    }

    fn execute_cmd(&mut self, cmd: Cmd<M::Message>) {
        match cmd {
            Cmd::None => {}
            Cmd::Quit => self.running = false,
            Cmd::Batch(cmds) => {
                for cmd in cmds {
                    self.execute_cmd(cmd);
                    if !self.running {
                        break;
                    }
                }
            }
            Cmd::Msg(msg) => self.send(msg),
            Cmd::Timer(deadline, on_fire) => {
                let at = deadline.resolve(self.clock.now());
                self.timers.schedule(at, on_fire);
            }
            Cmd::Redraw => self.redraws += 1,
        }
    }
}
