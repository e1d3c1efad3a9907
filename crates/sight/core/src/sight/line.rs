//! Integer Bresenham rasterization.
use std::iter::FusedIterator;

use crate::state::Position;

/// Cells on the Bresenham line from `from` to `to`, both endpoints included,
/// in order starting at `from`.
///
/// Pure integer stepping; the same endpoints always produce the same cells.
#[derive(Clone, Debug)]
pub struct Line {
    current: Position,
    end: Position,
    dx: i32,
    dy: i32,
    sx: i32,
    sy: i32,
    err: i32,
    done: bool,
}

impl Line {
    pub fn new(from: Position, to: Position) -> Self {
        let dx = (to.x - from.x).abs();
        let dy = -(to.y - from.y).abs();
        Self {
            current: from,
            end: to,
            dx,
            dy,
            sx: if from.x < to.x { 1 } else { -1 },
            sy: if from.y < to.y { 1 } else { -1 },
            err: dx + dy,
            done: false,
        }
    }
}

impl Iterator for Line {
    type Item = Position;

    fn next(&mut self) -> Option<Position> {
        if self.done {
            return None;
        }
        let point = self.current;
        if point == self.end {
            self.done = true;
        } else {
            let e2 = 2 * self.err;
            if e2 >= self.dy {
                self.err += self.dy;
                self.current.x += self.sx;
            }
            if e2 <= self.dx {
                self.err += self.dx;
                self.current.y += self.sy;
            }
        }
        Some(point)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.done {
            return (0, Some(0));
        }
        let remaining = self.current.chebyshev(self.end) as usize + 1;
        (remaining, Some(remaining))
    }
}

impl FusedIterator for Line {}

/// Every cell from `from` to `to` inclusive.
pub fn points_between(from: Position, to: Position) -> Vec<Position> {
    Line::new(from, to).collect()
}

/// Cells strictly between `from` and `to`.
pub fn interior(from: Position, to: Position) -> impl Iterator<Item = Position> {
    Line::new(from, to)
        .skip(1)
        .take_while(move |point| *point != to)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: i32, y: i32) -> Position {
        Position::new(x, y)
    }

    #[test]
    fn includes_both_endpoints_in_order() {
        assert_eq!(
            points_between(p(0, 0), p(3, 0)),
            vec![p(0, 0), p(1, 0), p(2, 0), p(3, 0)]
        );
        assert_eq!(
            points_between(p(2, 2), p(4, 4)),
            vec![p(2, 2), p(3, 3), p(4, 4)]
        );
        assert_eq!(points_between(p(5, 5), p(5, 5)), vec![p(5, 5)]);
    }

    #[test]
    fn steps_are_king_moves_in_every_octant() {
        let origin = p(0, 0);
        for (x, y) in [(7, 3), (3, 7), (-3, 7), (-7, 3), (-7, -3), (-3, -7), (3, -7), (7, -3)] {
            let line = points_between(origin, p(x, y));
            assert_eq!(line.first(), Some(&origin));
            assert_eq!(line.last(), Some(&p(x, y)));
            assert_eq!(line.len(), 8, "one cell per step along the major axis");
            for pair in line.windows(2) {
                assert_eq!(pair[0].chebyshev(pair[1]), 1);
            }
        }
    }

    #[test]
    fn deterministic_and_sized() {
        let a = points_between(p(1, 9), p(8, 2));
        let b = points_between(p(1, 9), p(8, 2));
        assert_eq!(a, b);
        assert_eq!(Line::new(p(1, 9), p(8, 2)).size_hint(), (a.len(), Some(a.len())));
    }

    #[test]
    fn interior_excludes_endpoints() {
        let cells: Vec<_> = interior(p(5, 1), p(5, 9)).collect();
        assert_eq!(cells.len(), 7);
        assert_eq!(cells.first(), Some(&p(5, 2)));
        assert_eq!(cells.last(), Some(&p(5, 8)));
        assert_eq!(interior(p(1, 1), p(2, 2)).count(), 0);
        assert_eq!(interior(p(1, 1), p(1, 1)).count(), 0);
    }
}
