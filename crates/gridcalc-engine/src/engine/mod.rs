//! Leaf types of the spreadsheet engine.
//!
//! Nothing in here knows about sheets:
//!
//! - [`Position`], [`Size`] - Grid coordinates (A1 notation ↔ row/col indices)
//! - [`CellValue`], [`FormulaError`] - The result of reading a cell
//! - [`Formula`], [`parse_formula`] - Arithmetic expressions over cell references
//! - [`format_number`] - Format numbers for display

mod format;
mod formula;
mod parser;
mod position;
mod value;

pub use format::format_number;
pub use formula::Formula;
pub use parser::{ParseError, parse_formula};
pub use position::{MAX_COLS, MAX_ROWS, Position, Size};
pub use value::{CellValue, FormulaError, parse_number};
