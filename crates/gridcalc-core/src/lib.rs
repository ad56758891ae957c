//! gridcalc-core - sheet model with dependency tracking.

pub mod error;
pub mod sheet;

pub use error::{Result, SheetError};
pub use sheet::{CellHandle, Sheet};

pub use gridcalc_engine::engine::{CellValue, FormulaError, Position, Size};
