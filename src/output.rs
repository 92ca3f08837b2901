//! Console output for the CLI.

use cadconv_converter::{ProgressSink, Stage};

/// Prints each conversion stage to stdout as it happens.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleProgress;

impl ProgressSink for ConsoleProgress {
    fn stage(&self, stage: &Stage) {
        println!("{stage}");
    }
}

/// Print a success line.
pub fn print_success(msg: &str) {
    println!("✓ {msg}");
}

/// Print a warning line.
pub fn print_warning(msg: &str) {
    println!("⚠ {msg}");
}

/// Print an error to stderr as `Error: <msg>`.
pub fn print_error(msg: &str) {
    eprintln!("Error: {msg}");
}

/// Print an aligned `key: value` line.
pub fn print_kv(key: &str, value: impl std::fmt::Display) {
    println!("  {:<16} {value}", format!("{key}:"));
}
