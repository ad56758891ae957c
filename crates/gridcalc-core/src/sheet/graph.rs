//! Dependency graph traversals over the sheet's cells.
//!
//! Forward edges are a cell's referenced positions (derived from its
//! formula); back edges are each cell's dependent set. Every walk here uses an
//! explicit stack and a visited set: chains can be as long as the sheet is
//! large, so nothing recurses per cell.

use gridcalc_engine::engine::{Position, Size};
use rustc_hash::{FxHashMap, FxHashSet};

use super::cell::Cell;

/// Position-keyed cell storage.
pub(crate) type Cells = FxHashMap<Position, Cell>;

/// Would giving `origin` the references in `proposed` close a cycle?
///
/// Walks forward edges starting from `proposed`, using existing content for
/// every other cell. Reaching `origin` again (including a direct
/// self-reference) means a cycle. Missing cells and invalid positions are
/// leaves.
pub(crate) fn would_create_cycle(cells: &Cells, origin: Position, proposed: &[Position]) -> bool {
    let mut visited = FxHashSet::default();
    let mut stack: Vec<Position> = proposed.iter().copied().filter(Position::is_valid).collect();

    while let Some(pos) = stack.pop() {
        if pos == origin {
            return true;
        }
        if !visited.insert(pos) {
            continue;
        }
        if let Some(cell) = cells.get(&pos) {
            stack.extend(cell.referenced_cells().iter().copied().filter(Position::is_valid));
        }
    }
    false
}

/// Clear the cached value of every cell that reads `origin`, directly or
/// transitively. `origin` itself is left alone.
///
/// Returns the number of cells visited.
pub(crate) fn invalidate_dependents(cells: &mut Cells, origin: Position) -> usize {
    let mut visited = FxHashSet::default();
    visited.insert(origin);
    let mut stack: Vec<Position> = match cells.get(&origin) {
        Some(cell) => cell.dependents().collect(),
        None => return 0,
    };

    let mut count = 0;
    while let Some(pos) = stack.pop() {
        if !visited.insert(pos) {
            continue;
        }
        let Some(cell) = cells.get_mut(&pos) else {
            continue;
        };
        cell.clear_cache();
        count += 1;
        stack.extend(cell.dependents());
    }
    count
}

/// Formula cells that must be computed before `root` can be read without
/// nested evaluation, in a safe evaluation order (precedents first).
///
/// Only uncached formulas are listed; cached cells and plain values cut the
/// walk short. `root` is last when it needs evaluation.
pub(crate) fn evaluation_order(cells: &Cells, root: Position) -> Vec<Position> {
    let mut order = Vec::new();
    let mut seen = FxHashSet::default();
    // (position, children already pushed)
    let mut stack = vec![(root, false)];

    while let Some((pos, expanded)) = stack.pop() {
        if expanded {
            order.push(pos);
            continue;
        }
        let Some(cell) = cells.get(&pos) else {
            continue;
        };
        if !cell.needs_evaluation() || !seen.insert(pos) {
            continue;
        }
        stack.push((pos, true));
        for &referenced in cell.referenced_cells() {
            if referenced.is_valid() && !seen.contains(&referenced) {
                stack.push((referenced, false));
            }
        }
    }
    order
}

/// Bounding box of all non-empty cells.
pub(crate) fn printable_bounds(cells: &Cells) -> Size {
    cells
        .iter()
        .filter(|(_, cell)| !cell.is_empty())
        .fold(Size::default(), |size, (pos, _)| size.including(*pos))
}
