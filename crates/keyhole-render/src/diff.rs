#![forbid(unsafe_code)]

//! Row-wise change detection between two buffers of equal size.

use crate::buffer::Buffer;

/// A horizontal run of changed cells on row `y`, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeRun {
    pub y: u16,
    pub x0: u16,
    pub x1: u16,
}

/// Compute the changed runs from `prev` to `next`.
///
/// Buffers of different size are treated as fully changed.
#[must_use]
pub fn diff_runs(prev: &Buffer, next: &Buffer) -> Vec<ChangeRun> {
    let same_size = prev.width() == next.width() && prev.height() == next.height();
    let mut runs = Vec::new();
    for y in 0..next.height() {
        let mut open: Option<u16> = None;
        for x in 0..next.width() {
            let changed = !same_size || prev.get(x, y) != next.get(x, y);
            match (changed, open) {
                (true, None) => open = Some(x),
                (false, Some(x0)) => {
                    runs.push(ChangeRun { y, x0, x1: x - 1 });
                    open = None;
                }
                _ => {}
            }
        }
        if let Some(x0) = open {
            runs.push(ChangeRun {
                y,
                x0,
                x1: next.width() - 1,
            });
        }
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyhole_style::Style;

    #[test]
    fn identical_buffers_have_no_runs() {
        let a = Buffer::new(10, 3);
        assert!(diff_runs(&a, &a.clone()).is_empty());
    }

    #[test]
    fn changes_are_grouped_per_row() {
        let a = Buffer::new(10, 2);
        let mut b = a.clone();
        b.set_string(2, 0, "abc", Style::new(), 10);
        b.set_string(9, 1, "z", Style::new(), 10);
        assert_eq!(
            diff_runs(&a, &b),
            [
                ChangeRun { y: 0, x0: 2, x1: 4 },
                ChangeRun { y: 1, x0: 9, x1: 9 },
            ]
        );
    }

    #[test]
    fn resize_marks_everything() {
        let runs = diff_runs(&Buffer::new(2, 2), &Buffer::new(3, 1));
        assert_eq!(runs, [ChangeRun { y: 0, x0: 0, x1: 2 }]);
    }
}
