#![forbid(unsafe_code)]

//! Top-level error for start-up and the run loop.

use std::fmt;
use std::io;

use keyhole_style::PaletteError;

use crate::config::ConfigError;
use crate::display::DisplayError;

/// Anything that stops the display from starting or keeps it from running.
#[derive(Debug)]
pub enum KeyholeError {
    Config(ConfigError),
    Palette(PaletteError),
    Display(DisplayError),
    Io(io::Error),
}

pub type Result<T> = std::result::Result<T, KeyholeError>;

impl fmt::Display for KeyholeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(err) => write!(f, "configuration error: {err}"),
            Self::Palette(err) => write!(f, "palette error: {err}"),
            Self::Display(err) => write!(f, "display error: {err}"),
            Self::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl std::error::Error for KeyholeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Palette(err) => Some(err),
            Self::Display(err) => Some(err),
            Self::Io(err) => Some(err),
        }
    }
}

impl From<ConfigError> for KeyholeError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

impl From<PaletteError> for KeyholeError {
    fn from(err: PaletteError) -> Self {
        Self::Palette(err)
    }
}

impl From<DisplayError> for KeyholeError {
    fn from(err: DisplayError) -> Self {
        Self::Display(err)
    }
}

impl From<io::Error> for KeyholeError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}
