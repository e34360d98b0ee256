#![forbid(unsafe_code)]

//! KeyHole front-panel display.
//!
//! The [`DisplayOrchestrator`] is the application model. It owns the palette
//! set, the [`FrameComposer`] chrome, the screens, the [`InputRouter`], and
//! the [`ClockTicker`], and is driven by the `keyhole-runtime` event loop.
//! Keyboard input and hardware button presses arrive through the same
//! channel as logical key symbols, so the router never knows which one it
//! is handling.

pub mod app;
pub mod buttons;
pub mod cli;
pub mod clock;
pub mod config;
pub mod detect;
pub mod display;
pub mod error;
pub mod input;
pub mod logging;
pub mod screens;

pub use app::{DisplayOrchestrator, Msg};
pub use buttons::{ButtonBinding, ButtonBindings, ButtonError, ButtonSource};
pub use clock::{ClockError, ClockFormat, ClockTicker, ClockZone};
pub use config::{AppConfig, ConfigError};
pub use display::{DisplayError, FrameComposer};
pub use error::{KeyholeError, Result};
pub use input::{InputRouter, Route};
pub use screens::{Screen, ScreenAction, ScreenId, ScreenState};
