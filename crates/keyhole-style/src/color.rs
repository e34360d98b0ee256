#![forbid(unsafe_code)]

//! Color types, color-spec parsing, profiles, and downgrade utilities.
//!
//! Color specs are the strings found in theme configuration:
//!
//! | Spec | Meaning |
//! |------|---------|
//! | `""`, `default` | terminal default |
//! | `dark blue`, `light gray`, `yellow`, … | one of the 16 named ANSI colors |
//! | `#0d0` | 12-bit RGB, each nibble doubled (`#00dd00`) |
//! | `#33aaff` | 24-bit RGB |
//! | `h208` | 256-color palette index |

use std::fmt;
use std::str::FromStr;

/// Terminal color profile used for downgrade decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorProfile {
    /// Standard 16 ANSI colors.
    Ansi16,
    /// Extended 256-color palette.
    Ansi256,
    /// Full 24-bit RGB color.
    TrueColor,
}

impl ColorProfile {
    /// Map a color depth (16, 256, or 2^24) to a profile.
    #[must_use]
    pub const fn from_depth(colors: u32) -> Option<Self> {
        match colors {
            16 => Some(Self::Ansi16),
            256 => Some(Self::Ansi256),
            16_777_216 => Some(Self::TrueColor),
            _ => None,
        }
    }

    /// Number of colors the profile can show.
    #[must_use]
    pub const fn depth(self) -> u32 {
        match self {
            Self::Ansi16 => 16,
            Self::Ansi256 => 256,
            Self::TrueColor => 16_777_216,
        }
    }
}

/// RGB color (opaque).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    /// Red channel (0–255).
    pub r: u8,
    /// Green channel (0–255).
    pub g: u8,
    /// Blue channel (0–255).
    pub b: u8,
}

impl Rgb {
    /// Create a new RGB color.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// ANSI 16-color indices (0-15).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Ansi16 {
    Black = 0,
    Red = 1,
    Green = 2,
    Yellow = 3,
    Blue = 4,
    Magenta = 5,
    Cyan = 6,
    White = 7,
    BrightBlack = 8,
    BrightRed = 9,
    BrightGreen = 10,
    BrightYellow = 11,
    BrightBlue = 12,
    BrightMagenta = 13,
    BrightCyan = 14,
    BrightWhite = 15,
}

/// Named colors accepted in color specs, in ANSI index order.
///
/// The names follow the traditional console palette: index 3 is "brown" and
/// the bright variant of index 7 is "white".
const NAMED_COLORS: [(&str, Ansi16); 16] = [
    ("black", Ansi16::Black),
    ("dark red", Ansi16::Red),
    ("dark green", Ansi16::Green),
    ("brown", Ansi16::Yellow),
    ("dark blue", Ansi16::Blue),
    ("dark magenta", Ansi16::Magenta),
    ("dark cyan", Ansi16::Cyan),
    ("light gray", Ansi16::White),
    ("dark gray", Ansi16::BrightBlack),
    ("light red", Ansi16::BrightRed),
    ("light green", Ansi16::BrightGreen),
    ("yellow", Ansi16::BrightYellow),
    ("light blue", Ansi16::BrightBlue),
    ("light magenta", Ansi16::BrightMagenta),
    ("light cyan", Ansi16::BrightCyan),
    ("white", Ansi16::BrightWhite),
];

impl Ansi16 {
    /// Return the raw ANSI index (0–15).
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Convert a `u8` index to an `Ansi16` variant, returning `None` if out of range.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        if value < 16 {
            Some(NAMED_COLORS[value as usize].1)
        } else {
            None
        }
    }

    /// The spec name of this color.
    #[must_use]
    pub const fn name(self) -> &'static str {
        NAMED_COLORS[self as usize].0
    }

    fn from_name(name: &str) -> Option<Self> {
        let name = name.replace("grey", "gray");
        NAMED_COLORS
            .iter()
            .find(|(candidate, _)| *candidate == name)
            .map(|(_, color)| *color)
    }
}

/// A color value at varying fidelity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Color {
    /// The terminal's default color.
    #[default]
    Default,
    /// True-color RGB value.
    Rgb(Rgb),
    /// 256-color palette index.
    Ansi256(u8),
    /// Standard 16-color ANSI value.
    Ansi16(Ansi16),
}

impl Color {
    /// Create a true-color RGB value.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::Rgb(Rgb::new(r, g, b))
    }

    /// Downgrade this color to fit the given color profile.
    #[must_use]
    pub fn downgrade(self, profile: ColorProfile) -> Self {
        match profile {
            ColorProfile::TrueColor => self,
            ColorProfile::Ansi256 => match self {
                Self::Rgb(rgb) => Self::Ansi256(rgb_to_256(rgb.r, rgb.g, rgb.b)),
                _ => self,
            },
            ColorProfile::Ansi16 => match self {
                Self::Rgb(rgb) => Self::Ansi16(rgb_to_ansi16(rgb)),
                Self::Ansi256(idx) => Self::Ansi16(rgb_to_ansi16(ansi256_to_rgb(idx))),
                _ => self,
            },
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str("default"),
            Self::Rgb(rgb) => write!(f, "#{:02x}{:02x}{:02x}", rgb.r, rgb.g, rgb.b),
            Self::Ansi256(idx) => write!(f, "h{idx}"),
            Self::Ansi16(color) => f.write_str(color.name()),
        }
    }
}

impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let trimmed = spec.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("default") {
            return Ok(Self::Default);
        }
        if let Some(hex) = trimmed.strip_prefix('#') {
            return parse_hex(hex).ok_or_else(|| ColorParseError::new(spec));
        }
        if let Some(index) = trimmed.strip_prefix('h')
            && !index.is_empty()
            && index.bytes().all(|b| b.is_ascii_digit())
        {
            return index
                .parse::<u8>()
                .map(Self::Ansi256)
                .map_err(|_| ColorParseError::new(spec));
        }
        Ansi16::from_name(&trimmed.to_ascii_lowercase())
            .map(Self::Ansi16)
            .ok_or_else(|| ColorParseError::new(spec))
    }
}

fn parse_hex(hex: &str) -> Option<Color> {
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let digits: Vec<u8> = hex
        .chars()
        .filter_map(|c| c.to_digit(16))
        .map(|d| d as u8)
        .collect();
    match digits.as_slice() {
        [r, g, b] => Some(Color::rgb(r * 17, g * 17, b * 17)),
        [r1, r0, g1, g0, b1, b0] => Some(Color::rgb(r1 * 16 + r0, g1 * 16 + g0, b1 * 16 + b0)),
        _ => None,
    }
}

/// A color spec that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorParseError {
    spec: String,
}

impl ColorParseError {
    pub(crate) fn new(spec: &str) -> Self {
        Self {
            spec: spec.to_string(),
        }
    }

    /// The offending spec.
    #[must_use]
    pub fn spec(&self) -> &str {
        &self.spec
    }
}

impl fmt::Display for ColorParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "malformed color spec {:?}", self.spec)
    }
}

impl std::error::Error for ColorParseError {}

const ANSI16_PALETTE: [Rgb; 16] = [
    Rgb::new(0, 0, 0),       // Black
    Rgb::new(205, 0, 0),     // Red
    Rgb::new(0, 205, 0),     // Green
    Rgb::new(205, 205, 0),   // Yellow
    Rgb::new(0, 0, 238),     // Blue
    Rgb::new(205, 0, 205),   // Magenta
    Rgb::new(0, 205, 205),   // Cyan
    Rgb::new(229, 229, 229), // White
    Rgb::new(127, 127, 127), // Bright Black
    Rgb::new(255, 0, 0),     // Bright Red
    Rgb::new(0, 255, 0),     // Bright Green
    Rgb::new(255, 255, 0),   // Bright Yellow
    Rgb::new(92, 92, 255),   // Bright Blue
    Rgb::new(255, 0, 255),   // Bright Magenta
    Rgb::new(0, 255, 255),   // Bright Cyan
    Rgb::new(255, 255, 255), // Bright White
];

/// Convert an RGB color to the nearest ANSI 256-color index.
#[must_use]
pub fn rgb_to_256(r: u8, g: u8, b: u8) -> u8 {
    if r == g && g == b {
        if r < 8 {
            return 16;
        }
        if r > 248 {
            return 231;
        }
        let idx = ((r - 8) / 10).min(23);
        return 232 + idx;
    }

    16 + 36 * cube_index(r) + 6 * cube_index(g) + cube_index(b)
}

/// Nearest 6×6×6 cube level for one channel.
///
/// Levels are `[0, 95, 135, 175, 215, 255]`; the cut points are the midpoints.
fn cube_index(v: u8) -> u8 {
    if v < 48 {
        0
    } else if v < 115 {
        1
    } else {
        (v - 35) / 40
    }
}

/// Convert an ANSI 256-color index to its RGB representation.
#[must_use]
pub fn ansi256_to_rgb(index: u8) -> Rgb {
    if index < 16 {
        return ANSI16_PALETTE[index as usize];
    }
    if index >= 232 {
        let gray = 8 + 10 * (index - 232);
        return Rgb::new(gray, gray, gray);
    }
    let idx = index - 16;
    let r = idx / 36;
    let g = (idx / 6) % 6;
    let b = idx % 6;
    const LEVELS: [u8; 6] = [0, 95, 135, 175, 215, 255];
    Rgb::new(LEVELS[r as usize], LEVELS[g as usize], LEVELS[b as usize])
}

/// Convert an RGB color to the nearest ANSI 16-color value.
#[must_use]
pub fn rgb_to_ansi16(target: Rgb) -> Ansi16 {
    let mut best = Ansi16::Black;
    let mut best_dist = u64::MAX;

    for (idx, candidate) in ANSI16_PALETTE.iter().enumerate() {
        let dist = weighted_distance(target, *candidate);
        if dist < best_dist {
            best = Ansi16::from_u8(idx as u8).unwrap_or(Ansi16::Black);
            best_dist = dist;
        }
    }

    best
}

fn weighted_distance(a: Rgb, b: Rgb) -> u64 {
    let dr = a.r as i32 - b.r as i32;
    let dg = a.g as i32 - b.g as i32;
    let db = a.b as i32 - b.b as i32;
    2126 * (dr * dr) as u64 + 7152 * (dg * dg) as u64 + 722 * (db * db) as u64
}
