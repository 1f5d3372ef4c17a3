//! Agent command: report which package manager would be used.

use color_eyre::eyre::{eyre, Result};

use crate::commands::dispatch;
use crate::config::Settings;
use crate::dispatch::{Outcome, Request};
use crate::output;

pub fn cmd_agent(settings: &Settings, request: &Request, json: bool) -> Result<()> {
    let Outcome::Reported(detection) = dispatch(settings, request)? else {
        return Err(eyre!("agent detection produced no report"));
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&detection)?);
    } else {
        output::print_detection(&detection);
    }
    Ok(())
}
