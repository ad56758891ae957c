use std::fmt;

use gridcalc_engine::engine::{CellValue, FormulaError, Position, Size, parse_number};

use super::cell::Cell;
use super::graph::{self, Cells};
use crate::error::{Result, SheetError};

/// A grid of cells with automatic, lazy recalculation.
#[derive(Debug, Default)]
pub struct Sheet {
    /// Every cell ever written or referenced. Cells are never removed, only
    /// emptied, since other cells may still hold back edges to them.
    pub(crate) cells: Cells,
    /// Extent covering every stored cell, placeholders included.
    pub(crate) size: Size,
    /// Bounding box of the non-empty cells.
    pub(crate) printable_size: Size,
}

impl Sheet {
    /// Create an empty sheet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a cell for reading.
    ///
    /// Returns `Ok(None)` when nothing is stored at `pos` or the cell is empty.
    pub fn cell(&self, pos: Position) -> Result<Option<CellHandle<'_>>> {
        check_position(pos)?;
        Ok(self.handle(pos))
    }

    pub fn printable_size(&self) -> Size {
        self.printable_size
    }

    pub fn allocated_size(&self) -> Size {
        self.size
    }

    pub(crate) fn handle(&self, pos: Position) -> Option<CellHandle<'_>> {
        self.cells
            .get(&pos)
            .filter(|cell| !cell.is_empty())
            .map(|cell| CellHandle {
                sheet: self,
                position: pos,
                cell,
            })
    }

    /// Value of the cell at `pos`.
    ///
    /// Uncached precedents are computed first, bottom-up, so reading the end
    /// of a long chain never nests one formula evaluation inside another.
    fn evaluate(&self, pos: Position) -> CellValue {
        let Some(cell) = self.cells.get(&pos) else {
            return CellValue::empty();
        };
        for precedent in graph::evaluation_order(&self.cells, pos) {
            if let Some(precedent) = self.cells.get(&precedent) {
                precedent.value(|r| self.lookup(r));
            }
        }
        cell.value(|r| self.lookup(r))
    }

    /// Resolve a reference inside a formula to a number.
    fn lookup(&self, pos: Position) -> std::result::Result<f64, FormulaError> {
        if !pos.is_valid() {
            return Err(FormulaError::Ref);
        }
        let Some(cell) = self.cells.get(&pos) else {
            return Ok(0.0);
        };
        if cell.is_empty() {
            return Ok(0.0);
        }
        match cell.value(|r| self.lookup(r)) {
            CellValue::Number(n) => Ok(n),
            CellValue::Error(e) => Err(e),
            CellValue::Text(text) => parse_number(&text).ok_or(FormulaError::Value),
        }
    }
}

pub(crate) fn check_position(pos: Position) -> Result<()> {
    if pos.is_valid() {
        Ok(())
    } else {
        Err(SheetError::InvalidPosition(pos))
    }
}

/// Read access to one non-empty cell of a [`Sheet`].
#[derive(Clone, Copy)]
pub struct CellHandle<'a> {
    sheet: &'a Sheet,
    position: Position,
    cell: &'a Cell,
}

impl<'a> CellHandle<'a> {
    pub fn position(&self) -> Position {
        self.position
    }

    /// The cell's input text (formulas in canonical form).
    pub fn text(&self) -> String {
        self.cell.text()
    }

    /// The computed value. Formula faults come back as [`CellValue::Error`].
    pub fn value(&self) -> CellValue {
        self.sheet.evaluate(self.position)
    }

    /// Positions read by the cell's formula, in order of appearance.
    pub fn referenced_cells(&self) -> &'a [Position] {
        self.cell.referenced_cells()
    }
}

impl fmt::Debug for CellHandle<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CellHandle")
            .field("position", &self.position)
            .field("text", &self.cell.text())
            .finish()
    }
}
