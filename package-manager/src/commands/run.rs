//! Run command implementation.

use color_eyre::eyre::Result;

use crate::commands::{dispatch, report};
use crate::config::Settings;
use crate::dispatch::Request;

/// Run a `package.json` script with the project's manager.
pub fn cmd_run(settings: &Settings, request: &Request) -> Result<()> {
    report(&dispatch(settings, request)?);
    Ok(())
}
