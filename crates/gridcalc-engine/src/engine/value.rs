//! The result of reading a cell.

use std::fmt;

use thiserror::Error;

use super::format::format_number;

/// Why a formula could not produce a number.
#[derive(Error, Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum FormulaError {
    /// Reference to a position outside the grid.
    #[error("#REF!")]
    Ref,
    /// Operand that is not a number.
    #[error("#VALUE!")]
    Value,
    /// Arithmetic fault (division by zero, overflow).
    #[error("#DIV/0!")]
    Div0,
}

/// Computed value of a cell.
#[derive(Clone, Debug, PartialEq)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Error(FormulaError),
}

impl CellValue {
    pub fn empty() -> CellValue {
        CellValue::Text(String::new())
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<Result<f64, FormulaError>> for CellValue {
    fn from(result: Result<f64, FormulaError>) -> Self {
        match result {
            Ok(n) => CellValue::Number(n),
            Err(e) => CellValue::Error(e),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(n) => f.write_str(&format_number(*n)),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Error(e) => write!(f, "{}", e),
        }
    }
}

/// Read text as a formula operand.
///
/// Leading whitespace is skipped; the rest must be a finite number.
pub fn parse_number(text: &str) -> Option<f64> {
    text.trim_start().parse::<f64>().ok().filter(|n| n.is_finite())
}
