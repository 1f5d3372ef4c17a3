//! Update command implementation.

use color_eyre::eyre::{eyre, Result};
use color_eyre::Section;

use crate::agent::Dialect;
use crate::commands::{dispatch, report};
use crate::config::Settings;
use crate::dispatch::Request;
use crate::error::{DispatchError, RenderError};

/// Update dependencies within their declared ranges.
pub fn cmd_update(settings: &Settings, request: &Request) -> Result<()> {
    let outcome = dispatch(settings, request).map_err(|e| {
        match e.downcast_ref::<DispatchError>() {
            Some(DispatchError::Render(RenderError::MissingParameter {
                dialect: Dialect::YarnModern,
                ..
            })) => eyre!("yarn 2+ cannot update every dependency at once")
                .suggestion("Name the packages to update, e.g. `anypm update react`"),
            _ => e,
        }
    })?;
    report(&outcome);
    Ok(())
}
