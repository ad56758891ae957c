//! Sheet state and logic.

mod cell;
mod graph;
mod io;
mod ops;
mod state;

pub use state::{CellHandle, Sheet};
