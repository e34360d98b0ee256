#![forbid(unsafe_code)]

//! Presenter: state-tracked terminal emission.
//!
//! The presenter remembers the last frame it painted and, on each
//! [`present`](Presenter::present), emits only the runs that changed. Colors
//! are downgraded to the configured [`ColorProfile`] on the way out.
//! [`invalidate`](Presenter::invalidate) forgets the previous frame so the
//! next one is painted in full.

use std::io::{self, BufWriter, Write};

use crossterm::style::{self as cts, Attribute};
use crossterm::{cursor, queue, terminal};
use keyhole_style::{Ansi16, Color, ColorProfile, Style, StyleFlags};

use crate::buffer::{Buffer, Cell};
use crate::diff::diff_runs;

/// Size of the internal write buffer.
const BUFFER_CAPACITY: usize = 16 * 1024;

/// Diffing terminal presenter.
pub struct Presenter<W: Write> {
    writer: BufWriter<W>,
    profile: ColorProfile,
    previous: Option<Buffer>,
    /// Last style emitted (None = unknown/reset).
    current_style: Option<Style>,
    cursor: Option<(u16, u16)>,
}

impl<W: Write> std::fmt::Debug for Presenter<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Presenter")
            .field("profile", &self.profile)
            .field("has_previous", &self.previous.is_some())
            .finish()
    }
}

impl<W: Write> Presenter<W> {
    pub fn new(writer: W, profile: ColorProfile) -> Self {
        Self {
            writer: BufWriter::with_capacity(BUFFER_CAPACITY, writer),
            profile,
            previous: None,
            current_style: None,
            cursor: None,
        }
    }

    #[must_use]
    pub const fn profile(&self) -> ColorProfile {
        self.profile
    }

    /// Paint `buffer`, emitting only what changed since the last frame.
    pub fn present(&mut self, buffer: &Buffer) -> io::Result<()> {
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!(
            "present",
            width = buffer.width(),
            height = buffer.height()
        )
        .entered();

        let runs = match &self.previous {
            Some(prev) => diff_runs(prev, buffer),
            None => {
                queue!(self.writer, terminal::Clear(terminal::ClearType::All))?;
                diff_runs(&Buffer::new(0, 0), buffer)
            }
        };

        #[cfg(feature = "tracing")]
        tracing::trace!(runs = runs.len(), "emitting runs");

        for run in runs {
            self.move_cursor_to(run.x0, run.y)?;
            for x in run.x0..=run.x1 {
                if let Some(cell) = buffer.get(x, run.y) {
                    self.emit_cell(*cell)?;
                }
            }
        }

        queue!(self.writer, cts::SetAttribute(Attribute::Reset))?;
        self.current_style = None;
        self.previous = Some(buffer.clone());
        self.writer.flush()
    }

    fn emit_cell(&mut self, cell: Cell) -> io::Result<()> {
        if cell.is_continuation() {
            return Ok(());
        }
        if self.current_style != Some(cell.style) {
            self.emit_style(cell.style)?;
        }
        queue!(self.writer, cts::Print(cell.ch))?;
        if let Some((x, y)) = self.cursor {
            self.cursor = Some((x + cell.width(), y));
        }
        Ok(())
    }

    /// Reset + apply; simpler than incremental attribute changes.
    fn emit_style(&mut self, style: Style) -> io::Result<()> {
        queue!(
            self.writer,
            cts::SetAttribute(Attribute::Reset),
            cts::SetForegroundColor(to_crossterm(style.fg.downgrade(self.profile))),
            cts::SetBackgroundColor(to_crossterm(style.bg.downgrade(self.profile))),
        )?;
        for (flag, attribute) in ATTRIBUTES {
            if style.attrs.contains(flag) {
                queue!(self.writer, cts::SetAttribute(attribute))?;
            }
        }
        self.current_style = Some(style);
        Ok(())
    }

    fn move_cursor_to(&mut self, x: u16, y: u16) -> io::Result<()> {
        if self.cursor == Some((x, y)) {
            return Ok(());
        }
        queue!(self.writer, cursor::MoveTo(x, y))?;
        self.cursor = Some((x, y));
        Ok(())
    }

    /// Forget the previous frame; the next present repaints everything.
    pub fn invalidate(&mut self) {
        self.previous = None;
        self.current_style = None;
        self.cursor = None;
    }

    /// Clear the terminal and invalidate.
    pub fn clear(&mut self) -> io::Result<()> {
        queue!(
            self.writer,
            cts::SetAttribute(Attribute::Reset),
            terminal::Clear(terminal::ClearType::All),
            cursor::MoveTo(0, 0)
        )?;
        self.invalidate();
        self.writer.flush()
    }

    /// Get the inner writer, flushing buffered output first.
    pub fn into_inner(self) -> io::Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| io::Error::other(e.to_string()))
    }
}

const ATTRIBUTES: [(StyleFlags, Attribute); 7] = [
    (StyleFlags::BOLD, Attribute::Bold),
    (StyleFlags::DIM, Attribute::Dim),
    (StyleFlags::ITALIC, Attribute::Italic),
    (StyleFlags::UNDERLINE, Attribute::Underlined),
    (StyleFlags::BLINK, Attribute::SlowBlink),
    (StyleFlags::REVERSE, Attribute::Reverse),
    (StyleFlags::STRIKETHROUGH, Attribute::CrossedOut),
];

/// Convert to the crossterm color model.
#[must_use]
pub fn to_crossterm(color: Color) -> cts::Color {
    match color {
        Color::Default => cts::Color::Reset,
        Color::Rgb(rgb) => cts::Color::Rgb {
            r: rgb.r,
            g: rgb.g,
            b: rgb.b,
        },
        Color::Ansi256(idx) => cts::Color::AnsiValue(idx),
        Color::Ansi16(c) => match c {
            Ansi16::Black => cts::Color::Black,
            Ansi16::Red => cts::Color::DarkRed,
            Ansi16::Green => cts::Color::DarkGreen,
            Ansi16::Yellow => cts::Color::DarkYellow,
            Ansi16::Blue => cts::Color::DarkBlue,
            Ansi16::Magenta => cts::Color::DarkMagenta,
            Ansi16::Cyan => cts::Color::DarkCyan,
            Ansi16::White => cts::Color::Grey,
            Ansi16::BrightBlack => cts::Color::DarkGrey,
            Ansi16::BrightRed => cts::Color::Red,
            Ansi16::BrightGreen => cts::Color::Green,
            Ansi16::BrightYellow => cts::Color::Yellow,
            Ansi16::BrightBlue => cts::Color::Blue,
            Ansi16::BrightMagenta => cts::Color::Magenta,
            Ansi16::BrightCyan => cts::Color::Cyan,
            Ansi16::BrightWhite => cts::Color::White,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(presenter: Presenter<Vec<u8>>) -> String {
        String::from_utf8(presenter.into_inner().unwrap()).unwrap()
    }

    fn frame(text: &str) -> Buffer {
        let mut buf = Buffer::new(8, 1);
        buf.set_string(0, 0, text, Style::new(), 8);
        buf
    }

    #[test]
    fn first_frame_is_painted_in_full() {
        let mut presenter = Presenter::new(Vec::new(), ColorProfile::Ansi256);
        presenter.present(&frame("hi")).unwrap();
        let out = output(presenter);
        assert!(out.contains("\x1b[2J"));
        assert!(out.contains("hi      "));
    }

    #[test]
    fn unchanged_frame_emits_no_text() {
        let mut presenter = Presenter::new(Vec::new(), ColorProfile::Ansi256);
        presenter.present(&frame("hello")).unwrap();
        let first_len = presenter.writer.get_ref().len();
        presenter.present(&frame("hello")).unwrap();
        let out = output(presenter);
        assert!(!out[first_len..].contains("hello"));
    }

    #[test]
    fn only_changed_run_is_emitted() {
        let mut presenter = Presenter::new(Vec::new(), ColorProfile::Ansi256);
        presenter.present(&frame("12:00:00")).unwrap();
        let first_len = presenter.writer.get_ref().len();
        presenter.present(&frame("12:00:01")).unwrap();
        let out = output(presenter);
        let tail = &out[first_len..];
        assert!(tail.contains('1'));
        assert!(!tail.contains("12:00"));
    }

    #[test]
    fn invalidate_forces_full_repaint() {
        let mut presenter = Presenter::new(Vec::new(), ColorProfile::Ansi256);
        presenter.present(&frame("abc")).unwrap();
        presenter.invalidate();
        let first_len = presenter.writer.get_ref().len();
        presenter.present(&frame("abc")).unwrap();
        let out = output(presenter);
        assert!(out[first_len..].contains("abc"));
    }

    #[test]
    fn colors_downgrade_to_profile() {
        let mut buf = Buffer::new(1, 1);
        buf.set(0, 0, Cell::new('x', Style::new().fg(Color::rgb(255, 0, 0))));
        let mut presenter = Presenter::new(Vec::new(), ColorProfile::Ansi16);
        presenter.present(&buf).unwrap();
        let out = output(presenter);
        // Bright red in the 16-color space, not a 38;2 true-color sequence.
        assert!(!out.contains("38;2"));
        assert!(out.contains("38;5;9"));
    }

    #[test]
    fn attributes_are_emitted() {
        let mut buf = Buffer::new(1, 1);
        buf.set(
            0,
            0,
            Cell::new('x', Style::new().attrs(StyleFlags::REVERSE | StyleFlags::BOLD)),
        );
        let mut presenter = Presenter::new(Vec::new(), ColorProfile::TrueColor);
        presenter.present(&buf).unwrap();
        let out = output(presenter);
        assert!(out.contains("\x1b[1m"));
        assert!(out.contains("\x1b[7m"));
    }
}
