#![forbid(unsafe_code)]

//! Widget primitives and the [`Node`] tree that composes them.
//!
//! Widgets are plain values: a screen builds a `Node` tree describing its
//! body, and the tree is rendered fresh each frame. Because nodes compare by
//! value, replacing a body with an equal tree is observably a no-op.

use keyhole_core::geometry::Rect;
use keyhole_style::StyleFlags;
use unicode_width::UnicodeWidthStr;

use crate::frame::Frame;

/// A renderable element.
pub trait Widget {
    /// Render the widget into `area`.
    fn render(&self, area: Rect, frame: &mut Frame<'_>);

    /// Rows the widget needs at `width`, or `None` if it fills whatever
    /// height it is given.
    fn height(&self, width: u16) -> Option<u16>;
}

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

/// Vertical placement inside a [`Filler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VAlign {
    Top,
    #[default]
    Middle,
    Bottom,
}

/// One or more lines of text, clipped to the area width.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Text {
    content: String,
    align: Align,
}

impl Text {
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            align: Align::Left,
        }
    }

    #[must_use]
    pub fn align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Replace the text in place, keeping the alignment.
    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }
}

impl Widget for Text {
    fn render(&self, area: Rect, frame: &mut Frame<'_>) {
        let style = frame.style();
        for (row, line) in self.content.lines().enumerate() {
            let Ok(row) = u16::try_from(row) else { break };
            if row >= area.height {
                break;
            }
            let line_width = u16::try_from(line.width()).unwrap_or(u16::MAX);
            let offset = match self.align {
                Align::Left => 0,
                Align::Center => area.width.saturating_sub(line_width) / 2,
                Align::Right => area.width.saturating_sub(line_width),
            };
            frame.buffer.set_string(
                area.x + offset,
                area.y + row,
                line,
                style,
                area.width - offset,
            );
        }
    }

    fn height(&self, _width: u16) -> Option<u16> {
        Some(u16::try_from(self.content.lines().count().max(1)).unwrap_or(u16::MAX))
    }
}

/// Side-by-side children with proportional widths.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Columns {
    columns: Vec<(u16, Node)>,
}

impl Columns {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a child taking `weight` shares of the width.
    #[must_use]
    pub fn push(mut self, weight: u16, child: impl Into<Node>) -> Self {
        self.columns.push((weight, child.into()));
        self
    }

    #[must_use]
    pub fn child(&self, index: usize) -> Option<&Node> {
        self.columns.get(index).map(|(_, child)| child)
    }

    pub fn child_mut(&mut self, index: usize) -> Option<&mut Node> {
        self.columns.get_mut(index).map(|(_, child)| child)
    }

    fn weights(&self) -> Vec<u16> {
        self.columns.iter().map(|(w, _)| *w).collect()
    }
}

impl Widget for Columns {
    fn render(&self, area: Rect, frame: &mut Frame<'_>) {
        for (rect, (_, child)) in area.columns(&self.weights()).into_iter().zip(&self.columns) {
            child.render(rect, frame);
        }
    }

    fn height(&self, width: u16) -> Option<u16> {
        let rects = Rect::from_size(width, 1).columns(&self.weights());
        rects
            .iter()
            .zip(&self.columns)
            .map(|(rect, (_, child))| child.height(rect.width))
            .try_fold(0, |acc, h| h.map(|h| acc.max(h)))
    }
}

/// Children stacked top to bottom.
///
/// Fixed-height children get their natural height; fill children share the
/// remaining rows, the first ones taking any remainder.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Pile {
    children: Vec<Node>,
}

impl Pile {
    #[must_use]
    pub fn new(children: Vec<Node>) -> Self {
        Self { children }
    }

    #[must_use]
    pub fn push(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    #[must_use]
    pub fn children(&self) -> &[Node] {
        &self.children
    }
}

impl Widget for Pile {
    fn render(&self, area: Rect, frame: &mut Frame<'_>) {
        let heights: Vec<Option<u16>> =
            self.children.iter().map(|c| c.height(area.width)).collect();
        let fixed: u16 = heights
            .iter()
            .flatten()
            .fold(0u16, |acc, h| acc.saturating_add(*h));
        let fills = heights.iter().filter(|h| h.is_none()).count() as u16;
        let spare = area.height.saturating_sub(fixed);
        let (share, mut extra) = match fills {
            0 => (0, 0),
            n => (spare / n, spare % n),
        };

        let mut rest = area;
        for (child, height) in self.children.iter().zip(heights) {
            let rows = height.unwrap_or_else(|| {
                let bonus = u16::from(extra > 0);
                extra = extra.saturating_sub(1);
                share + bonus
            });
            let (slot, remaining) = rest.split_top(rows);
            child.render(slot, frame);
            rest = remaining;
        }
    }

    fn height(&self, width: u16) -> Option<u16> {
        self.children
            .iter()
            .map(|c| c.height(width))
            .try_fold(0u16, |acc, h| h.map(|h| acc.saturating_add(h)))
    }
}

/// Horizontal padding around a child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Padding {
    left: u16,
    right: u16,
    child: Box<Node>,
}

impl Padding {
    #[must_use]
    pub fn new(left: u16, right: u16, child: impl Into<Node>) -> Self {
        Self {
            left,
            right,
            child: Box::new(child.into()),
        }
    }

    #[must_use]
    pub fn child(&self) -> &Node {
        &self.child
    }

    pub fn child_mut(&mut self) -> &mut Node {
        &mut self.child
    }
}

impl Widget for Padding {
    fn render(&self, area: Rect, frame: &mut Frame<'_>) {
        self.child
            .render(area.inset_horizontal(self.left, self.right), frame);
    }

    fn height(&self, width: u16) -> Option<u16> {
        self.child
            .height(width.saturating_sub(self.left).saturating_sub(self.right))
    }
}

/// Fills the available height, placing a fixed-height child inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filler {
    valign: VAlign,
    child: Box<Node>,
}

impl Filler {
    #[must_use]
    pub fn new(child: impl Into<Node>) -> Self {
        Self {
            valign: VAlign::Middle,
            child: Box::new(child.into()),
        }
    }

    #[must_use]
    pub fn valign(mut self, valign: VAlign) -> Self {
        self.valign = valign;
        self
    }
}

impl Widget for Filler {
    fn render(&self, area: Rect, frame: &mut Frame<'_>) {
        let rows = self
            .child
            .height(area.width)
            .unwrap_or(area.height)
            .min(area.height);
        let top = match self.valign {
            VAlign::Top => 0,
            VAlign::Middle => (area.height - rows) / 2,
            VAlign::Bottom => area.height - rows,
        };
        let slot = Rect::new(area.x, area.y + top, area.width, rows);
        self.child.render(slot, frame);
    }

    fn height(&self, _width: u16) -> Option<u16> {
        None
    }
}

/// Paints a palette region behind a child; the child inherits its style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Styled {
    region: String,
    attrs: StyleFlags,
    child: Box<Node>,
}

impl Styled {
    #[must_use]
    pub fn new(region: impl Into<String>, child: impl Into<Node>) -> Self {
        Self {
            region: region.into(),
            attrs: StyleFlags::empty(),
            child: Box::new(child.into()),
        }
    }

    /// Extra attributes layered over the region's own (e.g. reverse video).
    #[must_use]
    pub fn attrs(mut self, attrs: StyleFlags) -> Self {
        self.attrs = attrs;
        self
    }

    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }

    #[must_use]
    pub fn child(&self) -> &Node {
        &self.child
    }

    pub fn child_mut(&mut self) -> &mut Node {
        &mut self.child
    }
}

impl Widget for Styled {
    fn render(&self, area: Rect, frame: &mut Frame<'_>) {
        let style = frame.region_style(&self.region).add_attrs(self.attrs);
        frame.buffer.fill(area, style);
        frame.with_style(style, |frame| self.child.render(area, frame));
    }

    fn height(&self, width: u16) -> Option<u16> {
        self.child.height(width)
    }
}

/// A widget tree.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Node {
    #[default]
    Empty,
    Text(Text),
    Columns(Columns),
    Pile(Pile),
    Padding(Padding),
    Filler(Filler),
    Styled(Styled),
}

impl Widget for Node {
    fn render(&self, area: Rect, frame: &mut Frame<'_>) {
        if area.is_empty() {
            return;
        }
        match self {
            Self::Empty => {}
            Self::Text(w) => w.render(area, frame),
            Self::Columns(w) => w.render(area, frame),
            Self::Pile(w) => w.render(area, frame),
            Self::Padding(w) => w.render(area, frame),
            Self::Filler(w) => w.render(area, frame),
            Self::Styled(w) => w.render(area, frame),
        }
    }

    fn height(&self, width: u16) -> Option<u16> {
        match self {
            Self::Empty => Some(0),
            Self::Text(w) => w.height(width),
            Self::Columns(w) => w.height(width),
            Self::Pile(w) => w.height(width),
            Self::Padding(w) => w.height(width),
            Self::Filler(w) => w.height(width),
            Self::Styled(w) => w.height(width),
        }
    }
}

macro_rules! impl_from_widget {
    ($($ty:ident),*) => {
        $(
            impl From<$ty> for Node {
                fn from(widget: $ty) -> Self {
                    Self::$ty(widget)
                }
            }
        )*
    };
}

impl_from_widget!(Text, Columns, Pile, Padding, Filler, Styled);

impl From<&str> for Node {
    fn from(text: &str) -> Self {
        Self::Text(Text::new(text))
    }
}

impl From<String> for Node {
    fn from(text: String) -> Self {
        Self::Text(Text::new(text))
    }
}
