#![forbid(unsafe_code)]

//! Frame composer: persistent header/footer chrome around a swappable body.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ screen_name                          app_name│  header
//! │                                              │
//! │                    body                      │  background
//! │                                              │
//! │clock                                   status│  footer
//! └──────────────────────────────────────────────┘
//! ```
//!
//! The header and footer trees are built once. Setters rewrite the text
//! leaves in place and [`FrameComposer::set_body`] swaps only the body node,
//! so switching screens never rebuilds the chrome.

use std::fmt;

use keyhole_render::{Align, Buffer, Columns, Filler, Frame, Node, Padding, Styled, Text, Widget};
use keyhole_style::PaletteTable;

const SCREEN_NAME: usize = 0;
const APP_NAME: usize = 1;
const CLOCK: usize = 0;
const STATUS: usize = 1;

/// Misuse of the frame lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayError {
    /// `activate` was called a second time.
    AlreadyActivated,
}

impl fmt::Display for DisplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyActivated => write!(f, "the display frame is already active"),
        }
    }
}

impl std::error::Error for DisplayError {}

/// Header, footer, and body of the display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameComposer {
    header: Node,
    footer: Node,
    body: Node,
    active: bool,
    revision: u64,
}

impl FrameComposer {
    /// Build the chrome. Nothing is shown until [`activate`](Self::activate).
    #[must_use]
    pub fn new(app_name: &str) -> Self {
        let header = Styled::new(
            "header",
            Columns::new()
                .push(
                    1,
                    Styled::new("screen_name", Padding::new(1, 0, Text::new("..."))),
                )
                .push(
                    1,
                    Styled::new("app_name", Text::new(app_name).align(Align::Right)),
                ),
        );
        let footer = Styled::new(
            "footer",
            Columns::new()
                .push(1, Styled::new("clock", Text::new("")))
                .push(
                    1,
                    Styled::new("status", Text::new("Idle").align(Align::Right)),
                ),
        );
        Self {
            header: header.into(),
            footer: footer.into(),
            body: Filler::new(Text::new("")).into(),
            active: false,
            revision: 0,
        }
    }

    /// Bind the composed frame to the render surface. Must happen exactly once.
    ///
    /// # Errors
    ///
    /// Returns [`DisplayError::AlreadyActivated`] on a second call.
    pub fn activate(&mut self) -> Result<(), DisplayError> {
        if self.active {
            return Err(DisplayError::AlreadyActivated);
        }
        self.active = true;
        self.revision += 1;
        tracing::debug!("display frame activated");
        Ok(())
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Increments on every observable change.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn set_screen_name(&mut self, name: &str) {
        self.set_text(Part::Header, SCREEN_NAME, name);
    }

    pub fn set_status(&mut self, status: &str) {
        self.set_text(Part::Footer, STATUS, status);
    }

    pub fn set_clock(&mut self, clock: &str) {
        self.set_text(Part::Footer, CLOCK, clock);
    }

    /// Swap the body. Installing an equal body changes nothing.
    ///
    /// Returns whether the body changed.
    pub fn set_body(&mut self, body: impl Into<Node>) -> bool {
        let body = body.into();
        if body == self.body {
            return false;
        }
        self.body = body;
        self.revision += 1;
        true
    }

    #[must_use]
    pub fn body(&self) -> &Node {
        &self.body
    }

    #[must_use]
    pub fn screen_name(&self) -> &str {
        self.text(Part::Header, SCREEN_NAME)
    }

    #[must_use]
    pub fn app_name(&self) -> &str {
        self.text(Part::Header, APP_NAME)
    }

    #[must_use]
    pub fn status(&self) -> &str {
        self.text(Part::Footer, STATUS)
    }

    #[must_use]
    pub fn clock(&self) -> &str {
        self.text(Part::Footer, CLOCK)
    }

    /// Draw the whole frame into `buffer` with `palette`.
    pub fn render(&self, buffer: &mut Buffer, palette: &PaletteTable) {
        let area = buffer.bounds();
        let mut frame = Frame::new(buffer, palette);
        if !self.active {
            Node::from(Filler::new(Text::new("..."))).render(area, &mut frame);
            return;
        }

        let background = frame.region_style("background");
        frame.buffer.fill(area, background);
        frame.with_style(background, |frame| {
            let (header, rest) = area.split_top(1);
            let (body, footer) = rest.split_bottom(1);
            self.header.render(header, frame);
            self.body.render(body, frame);
            self.footer.render(footer, frame);
        });
    }

    fn set_text(&mut self, part: Part, column: usize, content: &str) {
        let root = match part {
            Part::Header => &mut self.header,
            Part::Footer => &mut self.footer,
        };
        if let Some(text) = text_mut(root, Some(column))
            && text.content() != content
        {
            text.set_content(content);
            self.revision += 1;
        }
    }

    fn text(&self, part: Part, column: usize) -> &str {
        let root = match part {
            Part::Header => &self.header,
            Part::Footer => &self.footer,
        };
        text_ref(root, Some(column)).map_or("", Text::content)
    }
}

#[derive(Debug, Clone, Copy)]
enum Part {
    Header,
    Footer,
}

/// Follow a chrome tree down to the text leaf of one column.
fn text_mut(node: &mut Node, column: Option<usize>) -> Option<&mut Text> {
    match node {
        Node::Text(text) if column.is_none() => Some(text),
        Node::Styled(styled) => text_mut(styled.child_mut(), column),
        Node::Padding(padding) => text_mut(padding.child_mut(), column),
        Node::Columns(columns) => text_mut(columns.child_mut(column?)?, None),
        _ => None,
    }
}

fn text_ref(node: &Node, column: Option<usize>) -> Option<&Text> {
    match node {
        Node::Text(text) if column.is_none() => Some(text),
        Node::Styled(styled) => text_ref(styled.child(), column),
        Node::Padding(padding) => text_ref(padding.child(), column),
        Node::Columns(columns) => text_ref(columns.child(column?)?, None),
        _ => None,
    }
}
