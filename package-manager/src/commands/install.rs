//! Install and clean-install.

use color_eyre::eyre::Result;
use owo_colors::OwoColorize;
use std::time::Instant;

use crate::commands::{dispatch, report};
use crate::config::Settings;
use crate::dispatch::{Outcome, Request};

/// Install dependencies, or add the requested packages.
pub fn cmd_install(settings: &Settings, request: &Request) -> Result<()> {
    let start = Instant::now();
    let outcome = dispatch(settings, request)?;
    report(&outcome);
    if let Outcome::Dispatched { .. } = outcome {
        eprintln!("Installed in {}ms", start.elapsed().as_millis().yellow());
    }
    Ok(())
}

pub fn cmd_clean_install(settings: &Settings, request: &Request) -> Result<()> {
    cmd_install(settings, request)
}
