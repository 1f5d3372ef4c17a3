//! One-line status messages for the user. Written to stderr so stdout stays with the child process.

use owo_colors::OwoColorize;

use crate::detect::DetectionResult;
use crate::system::CommandLine;

pub fn log_running(command: &CommandLine) {
    eprintln!("{} {}", " RUN ".on_cyan(), command.bold());
}

pub fn log_planned(command: &CommandLine) {
    eprintln!("{} {}", " DRY RUN ".on_blue(), command);
}

pub fn log_skipped(command: &CommandLine) {
    eprintln!(
        "{} dependencies unchanged, not running {}",
        " SKIP ".on_green(),
        command.dimmed()
    );
}

pub fn log_warning(text: &str) {
    eprintln!("{} {}", " WARNING ".on_yellow(), text);
}

/// Human-readable detection report, printed to stdout.
pub fn print_detection(detection: &DetectionResult) {
    println!("{}", detection.dialect.bold());
    println!("  {} {}", "source:".dimmed(), detection.source);
    if let Some(lockfile) = detection.lockfile {
        println!("  {} {}", "lockfile:".dimmed(), lockfile.file_name());
    }
    if let Some(pin) = &detection.pin {
        let pinned = match (&pin.manager, &pin.version) {
            (Some(manager), Some(version)) => format!("{manager}@{version}"),
            (Some(manager), None) => manager.clone(),
            (None, Some(version)) => format!("node {version}"),
            (None, None) => "node".to_string(),
        };
        println!("  {} {} ({})", "pin:".dimmed(), pinned, pin.tool);
    }
}
