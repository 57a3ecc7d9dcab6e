//! User-facing console messages for the binary.
//! Colors are used only when the stream they go to is a TTY.

use owo_colors::OwoColorize;
use std::path::Path;

use crate::fs_ops::SweepReport;

fn stdout_tty() -> bool {
    atty::is(atty::Stream::Stdout)
}

fn stderr_tty() -> bool {
    atty::is(atty::Stream::Stderr)
}

pub fn print_info(msg: &str) {
    if stdout_tty() {
        println!("{} {}", "info:".cyan().bold(), msg);
    } else {
        println!("info: {}", msg);
    }
}

pub fn print_warn(msg: &str) {
    if stderr_tty() {
        eprintln!("{} {}", "warn:".yellow().bold(), msg);
    } else {
        eprintln!("warn: {}", msg);
    }
}

pub fn print_error(msg: &str) {
    if stderr_tty() {
        eprintln!("{} {}", "error:".red().bold(), msg);
    } else {
        eprintln!("error: {}", msg);
    }
}

pub fn print_success(msg: &str) {
    if stdout_tty() {
        println!("{} {}", "ok:".green().bold(), msg);
    } else {
        println!("ok: {}", msg);
    }
}

/// Plain line without a prefix, for output meant to be scripted against.
pub fn print_user(msg: &str) {
    println!("{}", msg);
}

/// One line per swept path, then a summary.
pub fn print_sweep_report(dir: &Path, report: &SweepReport) {
    let verb = if report.dry_run { "would remove" } else { "removed" };
    for p in &report.removed {
        print_user(&format!("{verb} {}", p.display()));
    }
    for (p, reason) in &report.failed {
        print_warn(&format!("could not remove {}: {reason}", p.display()));
    }
    let summary = format!(
        "{}: {} {verb}, {} too recent, {} failed",
        dir.display(),
        report.removed.len(),
        report.skipped_recent.len(),
        report.failed.len()
    );
    if report.is_clean() {
        print_success(&summary);
    } else {
        print_warn(&summary);
    }
}
