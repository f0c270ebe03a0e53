//! Operator-facing commands.
//!
//! Each command takes a [`BackupContext`](crate::BackupContext), drives the
//! [`ProcessController`](crate::process::ProcessController) and prints a short
//! summary. A failed outcome is returned as an error so the binary exits
//! non-zero; nothing here panics on operator-visible failures.

pub mod run;
pub mod start;
pub mod status;
pub mod stop;

use crate::output::{Verbosity, get_verbosity};
use colored::Colorize;

pub fn print_success(message: &str) {
    if get_verbosity() == Verbosity::Quiet {
        return;
    }
    println!("{} {}", "✓".green().bold(), message);
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

pub fn print_info(message: &str) {
    if get_verbosity() == Verbosity::Quiet {
        return;
    }
    println!("{} {}", "ℹ".blue().bold(), message);
}

pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Indented `label: value` detail line under a summary
pub fn print_detail(label: &str, value: &str) {
    if get_verbosity() == Verbosity::Quiet {
        return;
    }
    println!("  {} {}", format!("{label}:").dimmed(), value);
}
