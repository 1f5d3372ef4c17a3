//! Exec and dlx: run a binary, local or fetched on demand.

use color_eyre::eyre::Result;

use crate::commands::{dispatch, report};
use crate::config::Settings;
use crate::dispatch::Request;

pub fn cmd_exec(settings: &Settings, request: &Request) -> Result<()> {
    report(&dispatch(settings, request)?);
    Ok(())
}

/// Download (if needed) and execute a package binary.
pub fn cmd_dlx(settings: &Settings, request: &Request) -> Result<()> {
    report(&dispatch(settings, request)?);
    Ok(())
}
