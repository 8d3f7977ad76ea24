use super::Engine;
use crate::Cell;

/// The living cells of an engine inside the half-open rectangle
/// `[top_left, bottom_right)`.
pub struct EngineWindow<'a> {
    tl: Cell,
    br: Cell,
    engine: &'a Engine,
}
impl<'a> EngineWindow<'a> {
    pub fn new(engine: &'a Engine, top_left: Cell, bottom_right: Cell) -> Self {
        Self {
            tl: top_left,
            br: bottom_right,
            engine,
        }
    }

    /// Visible cells in no particular order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Cell> {
        let rx = self.tl.x..self.br.x;
        let ry = self.tl.y..self.br.y;
        self.engine
            .living_cells()
            .iter()
            .filter(move |cell| rx.contains(&cell.x) && ry.contains(&cell.y))
    }

    /// Visible cells relative to the top left corner, in row-major order.
    pub fn to_local(&self) -> Vec<Cell> {
        let mut cells: Vec<Cell> = self.iter().map(|&cell| cell - self.tl).collect();
        cells.sort_unstable();
        cells
    }
}

impl std::fmt::Display for EngineWindow<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut last = Cell { x: -1, y: 0 };
        for alive in self.to_local() {
            // number of line breaks, then padding spaces up to the cell
            let lines = alive.y - last.y;
            let padding = match lines {
                0 => alive.x - last.x - 1,
                _ => alive.x,
            };
            write!(
                f,
                "{0:\n<1$}{0: <2$}█",
                "", lines as usize, padding as usize
            )?;
            last = alive;
        }
        Ok(())
    }
}
