#![forbid(unsafe_code)]

//! Terminal input sources for the event loop.

use std::collections::VecDeque;
use std::io;
use std::time::Duration;

use keyhole_core::event::Event;
#[cfg(not(target_arch = "wasm32"))]
use keyhole_core::terminal_session::TerminalSession;

/// Where the loop gets terminal input and size from.
pub trait EventSource {
    /// Current terminal size (columns, rows).
    fn size(&self) -> io::Result<(u16, u16)>;

    /// Wait up to `timeout` for input. Returns `Ok(true)` if an event is ready.
    fn poll_event(&mut self, timeout: Duration) -> io::Result<bool>;

    /// Read the next event; `Ok(None)` if it has no canonical form.
    fn read_event(&mut self) -> io::Result<Option<Event>>;
}

// =============================================================================
// CrosstermEventSource: EventSource adapter for TerminalSession
// =============================================================================

/// Adapter that reads events through a live [`TerminalSession`].
///
/// Owning the session ties terminal restoration to the source's lifetime.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug)]
pub struct CrosstermEventSource {
    session: TerminalSession,
}

#[cfg(not(target_arch = "wasm32"))]
impl CrosstermEventSource {
    #[must_use]
    pub fn new(session: TerminalSession) -> Self {
        Self { session }
    }

    /// Release the session, restoring the terminal.
    pub fn into_session(self) -> TerminalSession {
        self.session
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl EventSource for CrosstermEventSource {
    fn size(&self) -> io::Result<(u16, u16)> {
        self.session.size()
    }

    fn poll_event(&mut self, timeout: Duration) -> io::Result<bool> {
        self.session.poll_event(timeout)
    }

    fn read_event(&mut self) -> io::Result<Option<Event>> {
        self.session.read_event()
    }
}

// =============================================================================
// HeadlessEventSource: scripted event source for headless programs
// =============================================================================

/// A fixed-size source that replays a scripted list of events.
///
/// Once the script is exhausted, polling sleeps for the timeout and reports
/// no input, the way an idle terminal would.
#[derive(Debug, Clone)]
pub struct HeadlessEventSource {
    width: u16,
    height: u16,
    script: VecDeque<Event>,
}

impl HeadlessEventSource {
    #[must_use]
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            script: VecDeque::new(),
        }
    }

    #[must_use]
    pub fn with_events(mut self, events: impl IntoIterator<Item = Event>) -> Self {
        self.script.extend(events);
        self
    }
}

impl EventSource for HeadlessEventSource {
    fn size(&self) -> io::Result<(u16, u16)> {
        Ok((self.width, self.height))
    }

    fn poll_event(&mut self, timeout: Duration) -> io::Result<bool> {
        if self.script.is_empty() {
            std::thread::sleep(timeout);
            return Ok(false);
        }
        Ok(true)
    }

    fn read_event(&mut self) -> io::Result<Option<Event>> {
        let event = self.script.pop_front();
        if let Some(Event::Resize { width, height }) = event {
            self.width = width;
            self.height = height;
        }
        Ok(event)
    }
}
