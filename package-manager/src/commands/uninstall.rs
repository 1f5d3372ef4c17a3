//! Uninstall command implementation.

use color_eyre::eyre::Result;
use owo_colors::OwoColorize;

use crate::commands::{dispatch, report};
use crate::config::Settings;
use crate::dispatch::{Outcome, Request};

/// Remove packages from `package.json` and `node_modules`.
pub fn cmd_uninstall(settings: &Settings, request: &Request) -> Result<()> {
    let outcome = dispatch(settings, request)?;
    report(&outcome);
    if let Outcome::Dispatched { .. } = outcome {
        eprintln!("Removed {} packages", request.params.packages.len().yellow());
    }
    Ok(())
}
