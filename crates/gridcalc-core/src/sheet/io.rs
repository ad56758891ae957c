//! Tab-separated dumps of the printable area.

use std::io::{self, Write};

use gridcalc_engine::engine::Position;

use super::{CellHandle, Sheet};

impl Sheet {
    /// Write computed values, one row per line, fields separated by tabs.
    pub fn print_values<W: Write>(&self, output: &mut W) -> io::Result<()> {
        self.print_cells(output, |cell| cell.value().to_string())
    }

    /// Write input texts, one row per line, fields separated by tabs.
    pub fn print_texts<W: Write>(&self, output: &mut W) -> io::Result<()> {
        self.print_cells(output, |cell| cell.text())
    }

    fn print_cells<W, F>(&self, output: &mut W, render: F) -> io::Result<()>
    where
        W: Write,
        F: Fn(CellHandle<'_>) -> String,
    {
        let size = self.printable_size;
        for row in 0..size.rows {
            for col in 0..size.cols {
                if col > 0 {
                    output.write_all(b"\t")?;
                }
                if let Some(cell) = self.handle(Position::new(row, col)) {
                    output.write_all(render(cell).as_bytes())?;
                }
            }
            output.write_all(b"\n")?;
        }
        Ok(())
    }
}
