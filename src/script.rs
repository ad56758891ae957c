//! Line-oriented command scripts driving a [`Sheet`].
//!
//! ```text
//! # comments and blank lines are skipped
//! set A1 =B1+1
//! set B1 41
//! value A1
//! print values
//! ```

use std::io::{BufRead, Write};

use gridcalc_core::{Position, Sheet};
use tracing::debug;

use crate::error::{GridcalcError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrintMode {
    Values,
    Texts,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Everything after the address and one space is the cell text.
    Set { pos: Position, text: String },
    Clear(Position),
    Print(PrintMode),
    Size,
    Value(Position),
    Text(Position),
}

/// Parse one script line. Blank lines and `#` comments yield `None`.
pub fn parse_command(line: &str) -> std::result::Result<Option<Command>, String> {
    let trimmed = line.trim_start();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    let (keyword, rest) = trimmed.split_once(' ').unwrap_or((trimmed, ""));
    let command = match keyword {
        "set" => {
            let (addr, text) = rest.split_once(' ').unwrap_or((rest, ""));
            Command::Set {
                pos: parse_address(addr)?,
                text: text.to_string(),
            }
        }
        "clear" => Command::Clear(parse_address(rest.trim())?),
        "value" => Command::Value(parse_address(rest.trim())?),
        "text" => Command::Text(parse_address(rest.trim())?),
        "size" => Command::Size,
        "print" => match rest.trim() {
            "values" => Command::Print(PrintMode::Values),
            "texts" => Command::Print(PrintMode::Texts),
            other => return Err(format!("print expects 'values' or 'texts', got '{}'", other)),
        },
        other => return Err(format!("Unknown command: {}", other)),
    };
    Ok(Some(command))
}

fn parse_address(addr: &str) -> std::result::Result<Position, String> {
    if addr.is_empty() {
        return Err("missing cell address".to_string());
    }
    addr.parse()
}

/// Executes commands against one sheet, writing results to `out`.
pub struct Runner<W: Write> {
    sheet: Sheet,
    out: W,
    failures: usize,
}

impl<W: Write> Runner<W> {
    pub fn new(out: W) -> Self {
        Runner {
            sheet: Sheet::new(),
            out,
            failures: 0,
        }
    }

    /// Number of lines that failed so far.
    pub fn failures(&self) -> usize {
        self.failures
    }

    /// Run a single line. Line-level faults are reported on stderr and counted;
    /// only output errors are returned.
    pub fn run_line(&mut self, line_no: usize, line: &str) -> Result<()> {
        match self.execute(line_no, line) {
            Err(e) if e.is_recoverable() => {
                eprintln!("Error: {}", e);
                self.failures += 1;
                Ok(())
            }
            other => other,
        }
    }

    /// Run every line of `input`, numbering lines from 1.
    pub fn run_script<R: BufRead>(&mut self, input: R) -> Result<()> {
        for (idx, line) in input.lines().enumerate() {
            self.run_line(idx + 1, &line?)?;
        }
        self.out.flush()?;
        Ok(())
    }

    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.out
    }

    fn execute(&mut self, line: usize, text: &str) -> Result<()> {
        let Some(command) =
            parse_command(text).map_err(|message| GridcalcError::Parse { line, message })?
        else {
            return Ok(());
        };
        debug!(line, ?command, "executing");

        let sheet_err = |source| GridcalcError::Sheet { line, source };
        match command {
            Command::Set { pos, text } => self.sheet.set_cell(pos, &text).map_err(sheet_err)?,
            Command::Clear(pos) => self.sheet.clear_cell(pos).map_err(sheet_err)?,
            Command::Print(PrintMode::Values) => self.sheet.print_values(&mut self.out)?,
            Command::Print(PrintMode::Texts) => self.sheet.print_texts(&mut self.out)?,
            Command::Size => {
                let size = self.sheet.printable_size();
                writeln!(self.out, "{}x{}", size.rows, size.cols)?;
            }
            Command::Value(pos) => {
                let cell = self.sheet.cell(pos).map_err(sheet_err)?;
                let value = cell.map(|c| c.value().to_string()).unwrap_or_default();
                writeln!(self.out, "{}", value)?;
            }
            Command::Text(pos) => {
                let cell = self.sheet.cell(pos).map_err(sheet_err)?;
                let text = cell.map(|c| c.text()).unwrap_or_default();
                writeln!(self.out, "{}", text)?;
            }
        }
        Ok(())
    }
}
