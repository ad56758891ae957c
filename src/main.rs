//! Gridcalc - drive a spreadsheet engine from command scripts

mod error;
mod script;

use std::env;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use script::Runner;

fn print_usage() {
    eprintln!("Usage: gridcalc [OPTIONS] [FILE]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  [FILE]                    Script to run (default: stdin)");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -c, --command <CMD>       Run a single command (can be repeated)");
    eprintln!("  -h, --help                Print help");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  set <ADDR> <TEXT>         Set cell text (formulas start with '=')");
    eprintln!("  clear <ADDR>              Clear a cell");
    eprintln!("  value <ADDR>              Print a cell's value");
    eprintln!("  text <ADDR>               Print a cell's text");
    eprintln!("  print values|texts        Print the printable area");
    eprintln!("  size                      Print the printable size as ROWSxCOLS");
    eprintln!();
    eprintln!("Set GRIDCALC_LOG (e.g. 'debug') to enable diagnostics on stderr.");
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("GRIDCALC_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(file_path: Option<PathBuf>, commands: Vec<String>) -> anyhow::Result<usize> {
    let stdout = io::stdout();
    let mut runner = Runner::new(stdout.lock());

    if !commands.is_empty() {
        for (idx, command) in commands.iter().enumerate() {
            runner.run_line(idx + 1, command)?;
        }
    } else if let Some(path) = file_path {
        let file = File::open(&path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        runner.run_script(BufReader::new(file))?;
    } else {
        runner.run_script(io::stdin().lock())?;
    }

    Ok(runner.failures())
}

fn main() {
    let args: Vec<String> = env::args().collect();

    let mut file_path: Option<PathBuf> = None;
    let mut commands: Vec<String> = Vec::new();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_usage();
                return;
            }
            "-c" | "--command" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --command requires a value");
                    std::process::exit(1);
                }
                commands.push(args[i].to_string());
            }
            arg if arg.starts_with('-') && arg != "-" => {
                eprintln!("Error: Unknown option: {}", arg);
                print_usage();
                std::process::exit(1);
            }
            _ => {
                if file_path.is_none() {
                    if args[i] != "-" {
                        file_path = Some(PathBuf::from(&args[i]));
                    }
                } else {
                    eprintln!("Error: Unexpected argument: {}", args[i]);
                    print_usage();
                    std::process::exit(1);
                }
            }
        }
        i += 1;
    }

    init_logging();

    match run(file_path, commands) {
        Ok(0) => {}
        Ok(failures) => {
            tracing::debug!(failures, "script finished with errors");
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}
