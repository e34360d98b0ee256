#![forbid(unsafe_code)]

//! Core: terminal lifecycle, geometry, and canonical key events.

pub mod event;
pub mod geometry;
#[cfg(not(target_arch = "wasm32"))]
pub mod terminal_session;

pub use event::{Event, KeyCode, KeyEvent, KeyEventKind, Modifiers};
pub use geometry::Rect;
