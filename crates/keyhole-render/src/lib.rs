#![forbid(unsafe_code)]

//! Render: cell buffer, composable widgets, and the terminal presenter.
//!
//! Widgets draw into a [`Buffer`] through a [`Frame`], which carries the
//! active [`PaletteTable`](keyhole_style::PaletteTable) so that [`Styled`]
//! regions resolve to colors at render time. The [`Presenter`] diffs each
//! finished buffer against the previous one and emits only the changes.

pub mod buffer;
pub mod diff;
pub mod frame;
pub mod presenter;
pub mod widget;

pub use buffer::{Buffer, Cell};
pub use diff::{ChangeRun, diff_runs};
pub use frame::Frame;
pub use keyhole_core::geometry::Rect;
pub use presenter::Presenter;
pub use widget::{Align, Columns, Filler, Node, Padding, Pile, Styled, Text, VAlign, Widget};
