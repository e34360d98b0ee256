#![forbid(unsafe_code)]

//! Style: colors, text attributes, named themes, and palette tables.
//!
//! Themes are declared as ordered region → color-pair lists. At start-up they
//! are flattened into [`PaletteTable`]s by [`build_palette`], optionally
//! extended with one entry per hardware button, and never mutated afterward.

pub mod color;
pub mod palette;
pub mod style;
pub mod theme;

pub use color::{Ansi16, Color, ColorParseError, ColorProfile, Rgb};
pub use palette::{PaletteEntry, PaletteError, PaletteSet, PaletteTable, build_palette};
pub use style::{Style, StyleFlags};
pub use theme::{ColorPair, Theme};
