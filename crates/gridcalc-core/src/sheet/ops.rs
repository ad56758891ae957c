use gridcalc_engine::engine::Position;
use tracing::debug;

use super::Sheet;
use super::cell::{Cell, CellContent};
use super::graph;
use super::state::check_position;
use crate::error::{Result, SheetError};

impl Sheet {
    /// Set cell contents from input text.
    ///
    /// Text starting with `=` (and longer than that) is a formula; empty text
    /// empties the cell; anything else is literal text. On error the sheet is
    /// left exactly as it was.
    pub fn set_cell(&mut self, pos: Position, text: &str) -> Result<()> {
        check_position(pos)?;

        if self.cells.get(&pos).is_some_and(|cell| cell.text() == text) {
            return Ok(());
        }

        let content = CellContent::parse(text).inspect_err(|e| {
            debug!(%pos, error = %e, "rejected edit: formula syntax");
        })?;
        let referenced: Vec<Position> = content
            .referenced_cells()
            .iter()
            .copied()
            .filter(Position::is_valid)
            .collect();

        if graph::would_create_cycle(&self.cells, pos, &referenced) {
            debug!(%pos, "rejected edit: circular dependency");
            return Err(SheetError::CircularDependency(pos));
        }

        // Validated; from here on the edit always commits.
        self.size = self.size.including(pos);
        for &r in &referenced {
            if !self.cells.contains_key(&r) {
                self.cells.insert(r, Cell::default());
                self.size = self.size.including(r);
            }
        }

        let cell = self.cells.entry(pos).or_default();
        let was_empty = cell.is_empty();
        let old = cell.replace(content);
        let is_empty = cell.is_empty();

        self.unlink(pos, old.referenced_cells(), &referenced);
        for &r in &referenced {
            if let Some(target) = self.cells.get_mut(&r) {
                target.add_dependent(pos);
            }
        }

        let invalidated = graph::invalidate_dependents(&mut self.cells, pos);

        if !is_empty {
            self.printable_size = self.printable_size.including(pos);
        } else if !was_empty {
            self.printable_size = graph::printable_bounds(&self.cells);
        }

        debug!(
            %pos,
            references = referenced.len(),
            invalidated,
            "cell updated"
        );
        Ok(())
    }

    /// Clear the specified cell.
    ///
    /// The cell object stays in place (other cells may still point at it) but
    /// its content becomes empty and cells that read it are recomputed on
    /// their next read.
    pub fn clear_cell(&mut self, pos: Position) -> Result<()> {
        check_position(pos)?;

        let Some(cell) = self.cells.get_mut(&pos) else {
            return Ok(());
        };
        if cell.is_empty() {
            return Ok(());
        }
        let old = cell.clear();

        self.unlink(pos, old.referenced_cells(), &[]);
        let invalidated = graph::invalidate_dependents(&mut self.cells, pos);
        self.printable_size = graph::printable_bounds(&self.cells);

        debug!(%pos, invalidated, "cell cleared");
        Ok(())
    }

    /// Drop back edges from cells `pos` used to read but no longer does.
    fn unlink(&mut self, pos: Position, old: &[Position], kept: &[Position]) {
        for r in old {
            if kept.contains(r) {
                continue;
            }
            if let Some(target) = self.cells.get_mut(r) {
                target.remove_dependent(pos);
            }
        }
    }
}
