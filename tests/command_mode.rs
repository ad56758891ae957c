//! Integration tests for command mode (-c/--command flag and scripts on stdin)

use std::io::Write;
use std::process::{Command, Stdio};

fn run_command(args: &[&str]) -> (String, String, i32) {
    let output = Command::new("cargo")
        .arg("run")
        .arg("-q")
        .arg("--")
        .args(args)
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let exit_code = output.status.code().unwrap_or(-1);

    (stdout, stderr, exit_code)
}

fn run_script(script: &str) -> (String, String, i32) {
    let mut child = Command::new("cargo")
        .arg("run")
        .arg("-q")
        .arg("--")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn command");

    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(script.as_bytes())
        .expect("Failed to write script");

    let output = child.wait_with_output().expect("Failed to wait for command");
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let exit_code = output.status.code().unwrap_or(-1);

    (stdout, stderr, exit_code)
}

#[test]
fn test_basic_arithmetic() {
    let (stdout, _, code) = run_command(&["-c", "set A1 =5+3", "-c", "value A1"]);
    assert_eq!(stdout.trim(), "8");
    assert_eq!(code, 0);
}

#[test]
fn test_precedence_and_parentheses() {
    let (stdout, _, code) = run_command(&[
        "-c",
        "set A1 =2+3*4",
        "-c",
        "set A2 =(2+3)*4",
        "-c",
        "value A1",
        "-c",
        "value A2",
    ]);
    assert_eq!(stdout, "14\n20\n");
    assert_eq!(code, 0);
}

#[test]
fn test_canonical_text() {
    let (stdout, _, code) = run_command(&["-c", "set A1 =((1))+(2*3)", "-c", "text A1"]);
    assert_eq!(stdout.trim(), "=1+2*3");
    assert_eq!(code, 0);
}

#[test]
fn test_division_by_zero() {
    let (stdout, _, code) = run_command(&["-c", "set A1 =1/0", "-c", "value A1"]);
    assert_eq!(stdout.trim(), "#DIV/0!");
    assert_eq!(code, 0);
}

#[test]
fn test_absent_cell_prints_empty_line() {
    let (stdout, _, code) = run_command(&["-c", "value Z99"]);
    assert_eq!(stdout, "\n");
    assert_eq!(code, 0);
}

#[test]
fn test_cycle_is_reported() {
    let (stdout, stderr, code) = run_command(&[
        "-c",
        "set A1 =B1",
        "-c",
        "set B1 =A1",
        "-c",
        "text B1",
    ]);
    assert_eq!(stdout, "\n");
    assert!(stderr.contains("Error: line 2:"), "stderr: {}", stderr);
    assert_eq!(code, 1);
}

#[test]
fn test_syntax_error_is_reported() {
    let (_, stderr, code) = run_command(&["-c", "set A1 =1+"]);
    assert!(stderr.contains("Error: line 1:"), "stderr: {}", stderr);
    assert_eq!(code, 1);
}

#[test]
fn test_unknown_command() {
    let (_, stderr, code) = run_command(&["-c", "frobnicate A1"]);
    assert!(stderr.contains("Unknown command"));
    assert_eq!(code, 1);
}

#[test]
fn test_unknown_option() {
    let (_, stderr, code) = run_command(&["--bogus"]);
    assert!(stderr.contains("Unknown option"));
    assert_eq!(code, 1);
}

#[test]
fn test_script_from_stdin() {
    let script = "\
# totals
set A1 10
set A2 32
set A3 =A1+A2
print values
size
set A2 =A1*2
value A3
";
    let (stdout, stderr, code) = run_script(script);
    assert_eq!(stdout, "10\n32\n42\n3x1\n30\n");
    assert_eq!(stderr, "");
    assert_eq!(code, 0);
}

#[test]
fn test_script_continues_after_error() {
    let script = "\
set A1 =A1
set B1 7
value B1
";
    let (stdout, stderr, code) = run_script(script);
    assert_eq!(stdout, "7\n");
    assert!(stderr.contains("Error: line 1:"));
    assert_eq!(code, 1);
}
