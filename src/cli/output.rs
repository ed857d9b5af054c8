use std::sync::OnceLock;

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

/// How much the CLI prints to the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
}

static VERBOSITY: OnceLock<Verbosity> = OnceLock::new();

/// Set the global verbosity once at startup.
pub fn init(verbosity: Verbosity) {
    let _ = VERBOSITY.set(verbosity);
}

fn verbosity() -> Verbosity {
    VERBOSITY.get().copied().unwrap_or(Verbosity::Normal)
}

fn quiet() -> bool {
    verbosity() == Verbosity::Quiet
}

/// Print a success message.
pub fn success(msg: &str) {
    if !quiet() {
        println!("  {} {}", "✓".green(), msg);
    }
}

/// Print a warning message.
pub fn warning(msg: &str) {
    if !quiet() {
        println!("  {} {}", "⚠".yellow(), msg);
    }
}

/// Print an error message. Shown even in quiet mode.
pub fn error(msg: &str) {
    eprintln!("  {} {}", "✗".red(), msg);
}

/// Print a header line.
pub fn header(msg: &str) {
    if !quiet() {
        println!("\n{}", msg.bold());
    }
}

/// Print a dimmed detail line, only with `--verbose`.
pub fn detail(msg: &str) {
    if verbosity() == Verbosity::Verbose {
        println!("    {}", msg.dimmed());
    }
}

/// Progress bar for a batch of `len` files. Hidden in quiet mode.
pub fn progress_bar(len: u64, hidden: bool) -> ProgressBar {
    if hidden || quiet() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len);
    let style = ProgressStyle::with_template(
        "  {spinner:.green} [{elapsed_precise}] [{bar:30.cyan/blue}] {pos}/{len} {msg}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("#>-");
    pb.set_style(style);
    pb
}
