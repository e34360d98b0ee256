#![forbid(unsafe_code)]

//! Named themes: ordered region → color-pair declarations.

use crate::color::{Color, ColorParseError};
use crate::style::{Style, StyleFlags};

/// Foreground/background pair for one display region.
///
/// Text attributes ride along with the color specs, comma separated, the way
/// they are written in configuration: `("white,bold", "dark blue")`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ColorPair {
    pub fg: Color,
    pub bg: Color,
    pub attrs: StyleFlags,
}

impl ColorPair {
    #[must_use]
    pub const fn new(fg: Color, bg: Color) -> Self {
        Self {
            fg,
            bg,
            attrs: StyleFlags::empty(),
        }
    }

    /// Parse a pair of color specs.
    ///
    /// # Errors
    ///
    /// Returns the first spec that is not a known color or attribute list.
    pub fn parse(fg: &str, bg: &str) -> Result<Self, ColorParseError> {
        let (fg_color, fg_attrs) = parse_spec(fg)?;
        let (bg_color, bg_attrs) = parse_spec(bg)?;
        Ok(Self {
            fg: fg_color,
            bg: bg_color,
            attrs: fg_attrs | bg_attrs,
        })
    }

    /// The cell style this pair paints.
    #[must_use]
    pub const fn style(&self) -> Style {
        Style::new().fg(self.fg).bg(self.bg).attrs(self.attrs)
    }
}

fn parse_spec(spec: &str) -> Result<(Color, StyleFlags), ColorParseError> {
    let mut color = None;
    let mut attrs = StyleFlags::empty();
    for part in spec.split(',') {
        if let Some(flag) = StyleFlags::from_name(part) {
            attrs |= flag;
            continue;
        }
        if color.is_some() {
            return Err(ColorParseError::new(spec));
        }
        color = Some(part.parse::<Color>().map_err(|_| ColorParseError::new(spec))?);
    }
    Ok((color.unwrap_or_default(), attrs))
}

/// A named visual style: region names mapped to color pairs, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Theme {
    pub name: String,
    pub regions: Vec<(String, ColorPair)>,
}

impl Theme {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            regions: Vec::new(),
        }
    }

    /// Append a region declaration.
    #[must_use]
    pub fn region(mut self, name: impl Into<String>, colors: ColorPair) -> Self {
        self.regions.push((name.into(), colors));
        self
    }

    /// Look up a declared region.
    #[must_use]
    pub fn get(&self, region: &str) -> Option<&ColorPair> {
        self.regions
            .iter()
            .find(|(name, _)| name == region)
            .map(|(_, colors)| colors)
    }
}
