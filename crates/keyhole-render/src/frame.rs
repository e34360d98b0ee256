#![forbid(unsafe_code)]

//! Render target handed to widgets.

use keyhole_style::{PaletteTable, Style};

use crate::buffer::Buffer;

/// A buffer plus the palette and inherited style widgets draw with.
#[derive(Debug)]
pub struct Frame<'a> {
    pub buffer: &'a mut Buffer,
    palette: &'a PaletteTable,
    style: Style,
}

impl<'a> Frame<'a> {
    #[must_use]
    pub fn new(buffer: &'a mut Buffer, palette: &'a PaletteTable) -> Self {
        Self {
            buffer,
            palette,
            style: Style::new(),
        }
    }

    #[must_use]
    pub fn palette(&self) -> &PaletteTable {
        self.palette
    }

    /// The style inherited from the enclosing regions.
    #[must_use]
    pub const fn style(&self) -> Style {
        self.style
    }

    /// Resolve a palette region; unknown regions inherit the current style.
    #[must_use]
    pub fn region_style(&self, region: &str) -> Style {
        self.palette.lookup(region).unwrap_or(self.style)
    }

    /// Run `draw` with `style` as the inherited style, then restore it.
    pub fn with_style<R>(&mut self, style: Style, draw: impl FnOnce(&mut Self) -> R) -> R {
        let saved = std::mem::replace(&mut self.style, style);
        let result = draw(self);
        self.style = saved;
        result
    }
}
