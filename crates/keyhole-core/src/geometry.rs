#![forbid(unsafe_code)]

//! Geometric primitives.

/// A rectangle of terminal cells.
///
/// Uses terminal coordinates (0-indexed, origin at top-left).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    /// Left edge (inclusive).
    pub x: u16,
    /// Top edge (inclusive).
    pub y: u16,
    /// Width in cells.
    pub width: u16,
    /// Height in cells.
    pub height: u16,
}

impl Rect {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle from origin with given size.
    #[inline]
    pub const fn from_size(width: u16, height: u16) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Right edge (exclusive).
    #[inline]
    pub const fn right(&self) -> u16 {
        self.x.saturating_add(self.width)
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub const fn bottom(&self) -> u16 {
        self.y.saturating_add(self.height)
    }

    /// Check if the rectangle has zero area.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Check if a cell lies inside the rectangle.
    #[inline]
    pub const fn contains(&self, x: u16, y: u16) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Shrink horizontally by `left` and `right` cells, saturating at zero width.
    #[must_use]
    pub fn inset_horizontal(&self, left: u16, right: u16) -> Rect {
        let x = self.x.saturating_add(left).min(self.right());
        let width = self.width.saturating_sub(left).saturating_sub(right);
        Rect::new(x, self.y, width, self.height)
    }

    /// Split off the top `rows` rows, returning `(top, rest)`.
    #[must_use]
    pub fn split_top(&self, rows: u16) -> (Rect, Rect) {
        let rows = rows.min(self.height);
        (
            Rect::new(self.x, self.y, self.width, rows),
            Rect::new(self.x, self.y + rows, self.width, self.height - rows),
        )
    }

    /// Split off the bottom `rows` rows, returning `(rest, bottom)`.
    #[must_use]
    pub fn split_bottom(&self, rows: u16) -> (Rect, Rect) {
        let rows = rows.min(self.height);
        let rest = self.height - rows;
        (
            Rect::new(self.x, self.y, self.width, rest),
            Rect::new(self.x, self.y + rest, self.width, rows),
        )
    }

    /// Split into `weights.len()` side-by-side columns.
    ///
    /// Widths are proportional to the weights; rounding remainders go to the
    /// leftmost columns so the columns always tile the full width.
    #[must_use]
    pub fn columns(&self, weights: &[u16]) -> Vec<Rect> {
        let total: u32 = weights.iter().map(|&w| u32::from(w)).sum();
        if weights.is_empty() || total == 0 {
            return Vec::new();
        }
        let width = u32::from(self.width);
        let mut widths: Vec<u32> = weights
            .iter()
            .map(|&w| width * u32::from(w) / total)
            .collect();
        let mut remainder = width - widths.iter().sum::<u32>();
        for w in widths.iter_mut() {
            if remainder == 0 {
                break;
            }
            *w += 1;
            remainder -= 1;
        }

        let mut x = self.x;
        widths
            .into_iter()
            .map(|w| {
                let w = w as u16;
                let rect = Rect::new(x, self.y, w, self.height);
                x = x.saturating_add(w);
                rect
            })
            .collect()
    }
}
