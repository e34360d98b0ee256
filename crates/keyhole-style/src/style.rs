#![forbid(unsafe_code)]

//! Resolved cell style: colors plus text attributes.

use bitflags::bitflags;

use crate::color::Color;

bitflags! {
    /// Text attributes.
    #[derive(Default)]
    pub struct StyleFlags: u8 {
        const BOLD          = 0b0000_0001;
        const DIM           = 0b0000_0010;
        const ITALIC        = 0b0000_0100;
        const UNDERLINE     = 0b0000_1000;
        const BLINK         = 0b0001_0000;
        const REVERSE       = 0b0010_0000;
        const STRIKETHROUGH = 0b0100_0000;
    }
}

impl StyleFlags {
    /// Parse one attribute name as written in color specs (`bold`, `standout`, …).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let flag = match name.trim().to_ascii_lowercase().as_str() {
            "bold" => Self::BOLD,
            "dim" | "faint" => Self::DIM,
            "italics" | "italic" => Self::ITALIC,
            "underline" => Self::UNDERLINE,
            "blink" => Self::BLINK,
            "standout" | "reverse" => Self::REVERSE,
            "strikethrough" => Self::STRIKETHROUGH,
            _ => return None,
        };
        Some(flag)
    }
}

/// Foreground, background, and attributes of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Style {
    pub fg: Color,
    pub bg: Color,
    pub attrs: StyleFlags,
}

impl Style {
    /// The terminal's default style.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            fg: Color::Default,
            bg: Color::Default,
            attrs: StyleFlags::empty(),
        }
    }

    #[must_use]
    pub const fn fg(mut self, color: Color) -> Self {
        self.fg = color;
        self
    }

    #[must_use]
    pub const fn bg(mut self, color: Color) -> Self {
        self.bg = color;
        self
    }

    #[must_use]
    pub const fn attrs(mut self, attrs: StyleFlags) -> Self {
        self.attrs = attrs;
        self
    }

    /// Add attributes on top of the existing ones.
    #[must_use]
    pub fn add_attrs(mut self, attrs: StyleFlags) -> Self {
        self.attrs |= attrs;
        self
    }
}
