use crate::Cell;
use std::collections::HashSet;

/// B3/S23: a live cell survives with 2 or 3 live neighbors, a dead cell is
/// born with exactly 3.
#[inline]
pub(super) fn next_state(alive: bool, neighbors: u8) -> bool {
    matches!((alive, neighbors), (true, 2) | (_, 3))
}

#[inline]
pub(super) fn live_neighbors(alive: &HashSet<Cell>, cell: Cell) -> u8 {
    cell.neighbors().filter(|n| alive.contains(n)).count() as u8
}

/// Computes the living set of the next generation from a fixed snapshot.
///
/// Only living cells and the dead cells bordering them can be alive next
/// generation, so dead neighbors are collected while scanning the living
/// cells and each of them is checked for a birth exactly once.
pub(super) fn next_generation(alive: &HashSet<Cell>) -> HashSet<Cell> {
    let mut next = HashSet::with_capacity(alive.len());
    let mut candidates = HashSet::new();

    for &cell in alive {
        let mut neighbors = 0;
        for neighbor in cell.neighbors() {
            if alive.contains(&neighbor) {
                neighbors += 1;
            } else {
                candidates.insert(neighbor);
            }
        }
        if next_state(true, neighbors) {
            next.insert(cell);
        }
    }

    next.extend(
        candidates
            .into_iter()
            .filter(|&cell| next_state(false, live_neighbors(alive, cell))),
    );
    next
}
