use crate::Cell;

/// Iterator over the cells of a discrete line from `from` to `to`, both
/// inclusive (Bresenham).
///
/// Consecutive cells are 8-connected, so a fast pointer drag sampled at two
/// distant cells still paints a continuous stroke.
#[derive(Debug, Clone)]
pub struct LineCells {
    cursor: Cell,
    to: Cell,
    dx: i32,
    dy: i32,
    step: Cell,
    err: i32,
    done: bool,
}

impl LineCells {
    pub fn new(from: Cell, to: Cell) -> Self {
        let dx = (to.x - from.x).abs();
        let dy = (to.y - from.y).abs();
        let step = Cell {
            x: if from.x < to.x { 1 } else { -1 },
            y: if from.y < to.y { 1 } else { -1 },
        };
        Self {
            cursor: from,
            to,
            dx,
            dy,
            step,
            err: dx - dy,
            done: false,
        }
    }
}

impl Iterator for LineCells {
    type Item = Cell;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let current = self.cursor;
        if current == self.to {
            self.done = true;
            return Some(current);
        }

        let e2 = 2 * self.err;
        if e2 > -self.dy {
            self.err -= self.dy;
            self.cursor.x += self.step.x;
        }
        if e2 < self.dx {
            self.err += self.dx;
            self.cursor.y += self.step.y;
        }
        Some(current)
    }
}

impl std::iter::FusedIterator for LineCells {}
