//! Error types for the gridcalc binary

use gridcalc_core::SheetError;
use thiserror::Error;

/// Errors that can occur while running a script
#[derive(Error, Debug)]
pub enum GridcalcError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("line {line}: {source}")]
    Sheet {
        line: usize,
        #[source]
        source: SheetError,
    },
}

impl GridcalcError {
    /// True for faults that only affect one script line.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, GridcalcError::Io(_))
    }
}

pub type Result<T> = std::result::Result<T, GridcalcError>;
