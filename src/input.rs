//! Pointer gestures to engine calls.

use crate::{Cell, Engine, LineCells};

/// Maps a point on a drawing surface to the grid cell under it.
///
/// `origin` is the cell drawn at the surface's (0, 0) and `cell_size` the
/// width of one cell in surface units.
pub fn screen_to_cell(origin: Cell, px: f64, py: f64, cell_size: f64) -> Cell {
    debug_assert!(cell_size > 0.0, "cell size must be positive");
    origin
        + Cell {
            x: (px / cell_size).floor() as i32,
            y: (py / cell_size).floor() as i32,
        }
}

/// Turns press, drag and release of a pointer into cell edits.
///
/// Dragging paints every cell on the line between consecutive samples.
/// Releasing the pointer without ever leaving the pressed cell toggles it.
#[derive(Debug, Default)]
pub struct Brush {
    pressed: Option<Cell>,
    last: Option<Cell>,
    painted: bool,
}

impl Brush {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_down(&self) -> bool {
        self.pressed.is_some()
    }

    pub fn pointer_down(&mut self, cell: Cell) {
        self.pressed = Some(cell);
        self.last = Some(cell);
        self.painted = false;
    }

    pub fn pointer_move(&mut self, engine: &mut Engine, cell: Cell) {
        let Some(last) = self.last else {
            return;
        };
        if last == cell {
            return;
        }
        for c in LineCells::new(last, cell) {
            engine.add_cell(c);
        }
        self.last = Some(cell);
        self.painted = true;
    }

    pub fn pointer_up(&mut self, engine: &mut Engine) {
        if let Some(pressed) = self.pressed.take() {
            if !self.painted {
                engine.toggle(pressed);
            }
        }
        self.last = None;
        self.painted = false;
    }
}
