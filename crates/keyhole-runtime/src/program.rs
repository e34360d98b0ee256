#![forbid(unsafe_code)]

//! Program runtime: the update/view loop.
//!
//! # Loop Iteration
//!
//! 1. Poll terminal input for at most [`ProgramConfig::poll_cap`] (or until
//!    the next timer is due) and drain everything that is ready.
//! 2. Drain events pushed through [`EventSender`]s by background producers.
//! 3. Fire every due timer in deadline order.
//! 4. Render if any update ran.
//!
//! All model mutation happens on the thread calling [`Program::run`];
//! producers only ever touch the channel.

use std::fmt;
use std::io::{self, Stdout, Write};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::time::{Duration, Instant, SystemTime};

use keyhole_core::event::Event;
use keyhole_render::{Buffer, Presenter};
use keyhole_style::ColorProfile;
use tracing::{debug, debug_span, info, info_span, trace};

use crate::event_source::EventSource;
use crate::timer::{SystemTimeSource, TimeSource, TimerCallback, TimerQueue};

/// Thread-safe handle for delivering events into the loop.
pub type EventSender = Sender<Event>;

/// Receiving end of the event channel; the loop is its only consumer.
pub type EventInbox = Receiver<Event>;

/// Create the channel a [`Program`] drains, so producers can be started
/// before the program itself exists.
#[must_use]
pub fn event_channel() -> (EventSender, EventInbox) {
    mpsc::channel()
}

/// The application model.
pub trait Model {
    /// The message type. Terminal and channel events arrive via `From<Event>`.
    type Message: From<Event> + 'static;

    /// Called once when the program starts.
    fn init(&mut self) -> Cmd<Self::Message> {
        Cmd::none()
    }

    /// Apply a message and return follow-up commands.
    fn update(&mut self, msg: Self::Message) -> Cmd<Self::Message>;

    /// Render the current state into `buffer`.
    fn view(&self, buffer: &mut Buffer);
}

/// When a timer fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deadline {
    /// At an absolute wall-clock instant.
    At(SystemTime),
    /// After a delay from the moment the command is executed.
    After(Duration),
}

impl Deadline {
    #[must_use]
    pub fn resolve(self, now: SystemTime) -> SystemTime {
        match self {
            Self::At(instant) => instant,
            Self::After(delay) => now + delay,
        }
    }
}

/// Commands returned from `init`/`update`.
pub enum Cmd<M> {
    /// No operation.
    None,
    /// Stop the loop.
    Quit,
    /// Execute commands in order; stops at the first `Quit`.
    Batch(Vec<Cmd<M>>),
    /// Send a message to the model.
    Msg(M),
    /// Arm a single-shot timer. The callback receives the actual firing time.
    Timer(Deadline, TimerCallback<M>),
    /// Clear the terminal and repaint the next frame in full.
    Redraw,
}

impl<M> Default for Cmd<M> {
    fn default() -> Self {
        Self::None
    }
}

impl<M: fmt::Debug> fmt::Debug for Cmd<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Quit => write!(f, "Quit"),
            Self::Batch(cmds) => f.debug_tuple("Batch").field(cmds).finish(),
            Self::Msg(m) => f.debug_tuple("Msg").field(m).finish(),
            Self::Timer(deadline, _) => f.debug_tuple("Timer").field(deadline).finish(),
            Self::Redraw => write!(f, "Redraw"),
        }
    }
}

impl<M> Cmd<M> {
    #[inline]
    pub fn none() -> Self {
        Self::None
    }

    #[inline]
    pub fn quit() -> Self {
        Self::Quit
    }

    #[inline]
    pub fn msg(m: M) -> Self {
        Self::Msg(m)
    }

    #[inline]
    pub fn redraw() -> Self {
        Self::Redraw
    }

    /// Create a batch, collapsing trivial cases.
    pub fn batch(cmds: Vec<Self>) -> Self {
        let mut cmds: Vec<Self> = cmds
            .into_iter()
            .filter(|cmd| !matches!(cmd, Self::None))
            .collect();
        if cmds.len() > 1 {
            return Self::Batch(cmds);
        }
        cmds.pop().unwrap_or(Self::None)
    }

    /// Arm a timer whose message is built from the firing time.
    pub fn timer<F>(deadline: Deadline, on_fire: F) -> Self
    where
        F: FnOnce(SystemTime) -> M + 'static,
    {
        Self::Timer(deadline, Box::new(on_fire))
    }

    /// Stable name for tracing.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Quit => "Quit",
            Self::Batch(_) => "Batch",
            Self::Msg(_) => "Msg",
            Self::Timer(..) => "Timer",
            Self::Redraw => "Redraw",
        }
    }
}

/// Program configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramConfig {
    /// Longest single wait on terminal input, so channel events are seen promptly.
    pub poll_cap: Duration,
    /// Color depth of the render surface.
    pub color_profile: ColorProfile,
}

impl Default for ProgramConfig {
    fn default() -> Self {
        Self {
            poll_cap: Duration::from_millis(50),
            color_profile: ColorProfile::Ansi256,
        }
    }
}

/// The program runtime that manages the update/view loop.
pub struct Program<M: Model, E: EventSource, W: Write = Stdout> {
    model: M,
    events: E,
    presenter: Presenter<W>,
    timers: TimerQueue<M::Message>,
    clock: Box<dyn TimeSource>,
    sender: EventSender,
    inbox: Receiver<Event>,
    config: ProgramConfig,
    size: (u16, u16),
    running: bool,
    dirty: bool,
    frames: u64,
}

impl<M: Model, E: EventSource, W: Write> Program<M, E, W> {
    /// Create a program rendering to `writer`.
    ///
    /// # Errors
    ///
    /// Fails if the event source cannot report the terminal size.
    pub fn new(model: M, events: E, writer: W, config: ProgramConfig) -> io::Result<Self> {
        Self::with_channel(model, events, writer, config, event_channel())
    }

    /// Create a program draining an existing channel from [`event_channel`].
    ///
    /// # Errors
    ///
    /// Fails if the event source cannot report the terminal size.
    pub fn with_channel(
        model: M,
        events: E,
        writer: W,
        config: ProgramConfig,
        (sender, inbox): (EventSender, EventInbox),
    ) -> io::Result<Self> {
        let size = events.size()?;
        Ok(Self {
            model,
            events,
            presenter: Presenter::new(writer, config.color_profile),
            timers: TimerQueue::new(),
            clock: Box::new(SystemTimeSource),
            sender,
            inbox,
            config,
            size,
            running: true,
            dirty: true,
            frames: 0,
        })
    }

    /// Replace the wall clock.
    #[must_use]
    pub fn with_time_source(mut self, clock: impl TimeSource + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// A sender background producers use to feed events into the loop.
    #[must_use]
    pub fn event_sender(&self) -> EventSender {
        self.sender.clone()
    }

    #[must_use]
    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }

    #[must_use]
    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }

    /// Consume the program, returning the model and the event source.
    pub fn into_parts(self) -> (M, E) {
        (self.model, self.events)
    }

    /// Run until the model quits.
    ///
    /// # Errors
    ///
    /// Returns the first I/O error from the event source or the presenter.
    pub fn run(&mut self) -> io::Result<()> {
        let cmd = {
            let _span = info_span!("keyhole.program.init").entered();
            self.model.init()
        };
        self.execute_cmd(cmd)?;
        if self.running {
            self.render_frame()?;
        }

        while self.running {
            let now = self.clock.now();
            let timeout = self
                .timers
                .time_until_next(now)
                .map_or(self.config.poll_cap, |until| until.min(self.config.poll_cap));

            if self.events.poll_event(timeout)? {
                loop {
                    if let Some(event) = self.events.read_event()? {
                        self.handle_event(event)?;
                    }
                    if !self.running || !self.events.poll_event(Duration::ZERO)? {
                        break;
                    }
                }
            }

            self.drain_inbox()?;
            self.fire_due_timers()?;

            if self.running && self.dirty {
                self.render_frame()?;
            }
        }

        info!(frames = self.frames, "program loop finished");
        Ok(())
    }

    fn drain_inbox(&mut self) -> io::Result<()> {
        while self.running {
            match self.inbox.try_recv() {
                Ok(event) => self.handle_event(event)?,
                // The program holds a sender itself, so the channel never disconnects.
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        Ok(())
    }

    fn fire_due_timers(&mut self) -> io::Result<()> {
        let now = self.clock.now();
        while self.running {
            let Some((deadline, on_fire)) = self.timers.pop_due(now) else {
                break;
            };
            let late = now.duration_since(deadline).unwrap_or(Duration::ZERO);
            trace!(late_us = late.as_micros() as u64, "timer fired");
            self.dispatch(on_fire(now), "Timer")?;
        }
        Ok(())
    }

    fn handle_event(&mut self, event: Event) -> io::Result<()> {
        if let Event::Resize { width, height } = event {
            self.size = (width, height);
            self.presenter.invalidate();
        }
        self.dispatch(M::Message::from(event), "Event")
    }

    fn dispatch(&mut self, msg: M::Message, origin: &'static str) -> io::Result<()> {
        let cmd = {
            let _span = debug_span!(
                "keyhole.program.update",
                origin,
                duration_us = tracing::field::Empty,
                cmd_type = tracing::field::Empty
            )
            .entered();
            let start = Instant::now();
            let cmd = self.model.update(msg);
            tracing::Span::current().record("duration_us", start.elapsed().as_micros() as u64);
            tracing::Span::current().record("cmd_type", cmd.type_name());
            cmd
        };
        self.dirty = true;
        self.execute_cmd(cmd)
    }

    fn execute_cmd(&mut self, cmd: Cmd<M::Message>) -> io::Result<()> {
        match cmd {
            Cmd::None => {}
            Cmd::Quit => {
                debug!("quit requested");
                self.running = false;
            }
            Cmd::Batch(cmds) => {
                for cmd in cmds {
                    self.execute_cmd(cmd)?;
                    if !self.running {
                        break;
                    }
                }
            }
            Cmd::Msg(msg) => self.dispatch(msg, "Cmd")?,
            Cmd::Timer(deadline, on_fire) => {
                let at = deadline.resolve(self.clock.now());
                self.timers.schedule(at, on_fire);
            }
            Cmd::Redraw => {
                self.presenter.clear()?;
                self.dirty = true;
            }
        }
        Ok(())
    }

    fn render_frame(&mut self) -> io::Result<()> {
        let (width, height) = self.size;
        let mut buffer = Buffer::new(width, height);
        self.model.view(&mut buffer);
        self.presenter.present(&buffer)?;
        self.frames += 1;
        self.dirty = false;
        Ok(())
    }
}

impl<M: Model, E: EventSource, W: Write> fmt::Debug for Program<M, E, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Program")
            .field("size", &self.size)
            .field("running", &self.running)
            .field("pending_timers", &self.timers.len())
            .field("frames", &self.frames)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_source::HeadlessEventSource;
    use keyhole_core::event::{KeyCode, KeyEvent};

    #[derive(Debug)]
    enum Msg {
        Key(char),
        Other,
        Fired(SystemTime),
    }

    impl From<Event> for Msg {
        fn from(event: Event) -> Self {
            match event {
                Event::Key(KeyEvent {
                    code: KeyCode::Char(c),
                    ..
                }) => Msg::Key(c),
                _ => Msg::Other,
            }
        }
    }

    #[derive(Default)]
    struct Recorder {
        keys: Vec<char>,
        fired: usize,
    }

    impl Model for Recorder {
        type Message = Msg;

        fn update(&mut self, msg: Msg) -> Cmd<Msg> {
            match msg {
                Msg::Key('q') => Cmd::quit(),
                Msg::Key('t') => Cmd::timer(Deadline::After(Duration::from_millis(5)), Msg::Fired),
                Msg::Key(c) => {
                    self.keys.push(c);
                    Cmd::none()
                }
                Msg::Fired(_) => {
                    self.fired += 1;
                    Cmd::quit()
                }
                Msg::Other => Cmd::none(),
            }
        }

        fn view(&self, buffer: &mut Buffer) {
            let text: String = self.keys.iter().collect();
            buffer.set_string(0, 0, &text, keyhole_style::Style::new(), buffer.width());
        }
    }

    fn key(c: char) -> Event {
        Event::Key(KeyEvent::new(KeyCode::Char(c)))
    }

    #[test]
    fn runs_until_quit() {
        let source = HeadlessEventSource::new(10, 2).with_events([key('a'), key('b'), key('q'), key('c')]);
        let mut program =
            Program::new(Recorder::default(), source, Vec::new(), ProgramConfig::default()).unwrap();
        program.run().unwrap();
        assert_eq!(program.model().keys, ['a', 'b']);
        assert!(program.frames_rendered() >= 1);
    }

    #[test]
    fn timers_fire_and_channel_is_drained() {
        let source = HeadlessEventSource::new(10, 2);
        let mut program =
            Program::new(Recorder::default(), source, Vec::new(), ProgramConfig::default()).unwrap();
        let sender = program.event_sender();
        std::thread::spawn(move || {
            sender.send(key('x')).unwrap();
            sender.send(key('t')).unwrap();
        })
        .join()
        .unwrap();
        program.run().unwrap();
        assert_eq!(program.model().keys, ['x']);
        assert_eq!(program.model().fired, 1);
    }

    #[test]
    fn events_sent_before_the_program_exists_are_delivered() {
        let (sender, inbox) = event_channel();
        sender.send(key('y')).unwrap();
        sender.send(key('q')).unwrap();
        let source = HeadlessEventSource::new(10, 2);
        let mut program = Program::with_channel(
            Recorder::default(),
            source,
            Vec::new(),
            ProgramConfig::default(),
            (sender, inbox),
        )
        .unwrap();
        program.run().unwrap();
        assert_eq!(program.model().keys, ['y']);
    }

    #[test]
    fn batch_collapses() {
        assert!(matches!(Cmd::<Msg>::batch(vec![]), Cmd::None));
        assert!(matches!(Cmd::<Msg>::batch(vec![Cmd::None, Cmd::Quit]), Cmd::Quit));
        assert!(matches!(
            Cmd::<Msg>::batch(vec![Cmd::Redraw, Cmd::Quit]),
            Cmd::Batch(v) if v.len() == 2
        ));
    }

    #[test]
    fn deadline_resolution() {
        let now = SystemTime::UNIX_EPOCH + Duration::from_secs(10);
        assert_eq!(Deadline::After(Duration::from_secs(5)).resolve(now), now + Duration::from_secs(5));
        assert_eq!(Deadline::At(now).resolve(SystemTime::UNIX_EPOCH), now);
    }
}
