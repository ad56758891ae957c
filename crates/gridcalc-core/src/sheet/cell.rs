//! Cell data structures for the sheet.
//!
//! - [`CellContent`] - What the user typed: empty, literal text, or a formula
//! - [`Cell`] - A graph node: content plus the positions that read this cell
//!
//! Both are crate-private. Callers outside the crate read cells through
//! [`CellHandle`](super::CellHandle) and edit them through the sheet, so the
//! dependency bookkeeping here can only be touched by the sheet itself.

use std::cell::OnceCell;

use gridcalc_engine::engine::{
    CellValue, Formula, FormulaError, ParseError, Position, parse_formula,
};
use rustc_hash::FxHashSet;
use tracing::trace;

/// Input prefix that makes a cell a formula.
pub(crate) const FORMULA_SIGN: char = '=';
/// Input prefix that forces the rest of the input to be read as text.
pub(crate) const ESCAPE_SIGN: char = '\'';

/// The content of a cell.
#[derive(Debug, Default)]
pub(crate) enum CellContent {
    #[default]
    Empty,
    /// Verbatim input, including a leading escape sign.
    Text(String),
    Formula {
        formula: Formula,
        /// Filled by the first read, emptied by [`CellContent::clear_cache`].
        cache: OnceCell<CellValue>,
    },
}

impl CellContent {
    /// Parse user input into content.
    /// - Empty string -> Empty
    /// - `=` followed by anything -> Formula (fails on bad syntax)
    /// - Otherwise (including a lone `=`) -> Text
    pub(crate) fn parse(input: &str) -> Result<CellContent, ParseError> {
        if input.is_empty() {
            return Ok(CellContent::Empty);
        }
        match input.strip_prefix(FORMULA_SIGN) {
            Some(expression) if !expression.is_empty() => Ok(CellContent::Formula {
                formula: parse_formula(expression)?,
                cache: OnceCell::new(),
            }),
            _ => Ok(CellContent::Text(input.to_string())),
        }
    }

    /// Text to show when editing. Formulas are rebuilt from their tree.
    pub(crate) fn text(&self) -> String {
        match self {
            CellContent::Empty => String::new(),
            CellContent::Text(text) => text.clone(),
            CellContent::Formula { formula, .. } => {
                format!("{}{}", FORMULA_SIGN, formula.expression())
            }
        }
    }

    /// Compute (or return the cached) value. `lookup` resolves references.
    pub(crate) fn value<F>(&self, lookup: F) -> CellValue
    where
        F: Fn(Position) -> Result<f64, FormulaError>,
    {
        match self {
            CellContent::Empty => CellValue::empty(),
            CellContent::Text(text) => {
                let text = text.strip_prefix(ESCAPE_SIGN).unwrap_or(text);
                CellValue::Text(text.to_string())
            }
            CellContent::Formula { formula, cache } => cache
                .get_or_init(|| {
                    let value = CellValue::from(formula.evaluate(lookup));
                    trace!(formula = %formula, %value, "evaluated formula");
                    value
                })
                .clone(),
        }
    }

    pub(crate) fn referenced_cells(&self) -> &[Position] {
        match self {
            CellContent::Formula { formula, .. } => formula.referenced_cells(),
            CellContent::Empty | CellContent::Text(_) => &[],
        }
    }

    pub(crate) fn clear_cache(&mut self) {
        if let CellContent::Formula { cache, .. } = self {
            cache.take();
        }
    }

    fn is_cached(&self) -> bool {
        match self {
            CellContent::Formula { cache, .. } => cache.get().is_some(),
            CellContent::Empty | CellContent::Text(_) => true,
        }
    }
}

/// A node in the sheet's dependency graph.
#[derive(Debug, Default)]
pub(crate) struct Cell {
    content: CellContent,
    /// Positions whose formulas read this cell.
    dependents: FxHashSet<Position>,
}

impl Cell {
    pub(crate) fn text(&self) -> String {
        self.content.text()
    }

    pub(crate) fn value<F>(&self, lookup: F) -> CellValue
    where
        F: Fn(Position) -> Result<f64, FormulaError>,
    {
        self.content.value(lookup)
    }

    pub(crate) fn referenced_cells(&self) -> &[Position] {
        self.content.referenced_cells()
    }

    /// Swap in new content, returning the old one. Dependents are kept.
    pub(crate) fn replace(&mut self, content: CellContent) -> CellContent {
        std::mem::replace(&mut self.content, content)
    }

    /// Reset to empty content, returning the old one. Dependents are kept.
    pub(crate) fn clear(&mut self) -> CellContent {
        std::mem::take(&mut self.content)
    }

    pub(crate) fn is_empty(&self) -> bool {
        matches!(self.content, CellContent::Empty)
    }

    pub(crate) fn clear_cache(&mut self) {
        self.content.clear_cache();
    }

    /// True for a formula whose value has not been computed yet.
    pub(crate) fn needs_evaluation(&self) -> bool {
        !self.content.is_cached()
    }

    pub(crate) fn add_dependent(&mut self, pos: Position) {
        self.dependents.insert(pos);
    }

    pub(crate) fn remove_dependent(&mut self, pos: Position) {
        self.dependents.remove(&pos);
    }

    pub(crate) fn dependents(&self) -> impl Iterator<Item = Position> + '_ {
        self.dependents.iter().copied()
    }
}
