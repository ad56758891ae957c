//! gridcalc_engine - positions, values and arithmetic formulas.

pub mod engine;
