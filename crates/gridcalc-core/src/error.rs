//! Error types for gridcalc core.

use thiserror::Error;

use gridcalc_engine::engine::{ParseError, Position};

/// Structural faults raised by sheet edits and lookups.
///
/// The sheet is left unchanged whenever one of these is returned.
#[derive(Error, Clone, Debug, PartialEq)]
pub enum SheetError {
    #[error("Invalid position ({}, {})", .0.row, .0.col)]
    InvalidPosition(Position),

    #[error("Circular dependency detected at {0}")]
    CircularDependency(Position),

    #[error("Formula syntax error: {0}")]
    FormulaSyntax(#[from] ParseError),
}

pub type Result<T> = std::result::Result<T, SheetError>;
