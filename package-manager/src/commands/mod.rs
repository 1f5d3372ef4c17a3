//! Command implementations: each turns a subcommand into a dispatch and reports the outcome.

mod agent;
mod exec;
mod install;
mod run;
mod uninstall;
mod update;

pub use agent::cmd_agent;
pub use exec::{cmd_dlx, cmd_exec};
pub use install::{cmd_clean_install, cmd_install};
pub use run::cmd_run;
pub use uninstall::cmd_uninstall;
pub use update::cmd_update;

use color_eyre::eyre::{Report, Result};
use color_eyre::Section;
use itertools::Itertools;
use std::process::exit;

use crate::agent::ManagerName;
use crate::cli::Subcommand;
use crate::config::Settings;
use crate::dispatch::{Collaborators, Dispatcher, Outcome, Request};
use crate::env_override::{EnvOverride, ENV_VAR};
use crate::error::{DetectError, DispatchError, InteractiveError, RenderError};
use crate::interactive::EXPECTED;
use crate::output;
use crate::probe::PathProber;
use crate::system::{ProcessRunner, ProcessVersionReporter, TerminalInput};

/// Execute the appropriate command based on CLI arguments.
pub fn execute_command(cmd: &Subcommand, settings: &Settings) -> Result<()> {
    let request = cmd.request();
    match cmd {
        Subcommand::Install { .. } => cmd_install(settings, &request),
        Subcommand::CleanInstall { .. } => cmd_clean_install(settings, &request),
        Subcommand::Run { .. } => cmd_run(settings, &request),
        Subcommand::Exec { .. } => cmd_exec(settings, &request),
        Subcommand::Dlx { .. } => cmd_dlx(settings, &request),
        Subcommand::Update { .. } => cmd_update(settings, &request),
        Subcommand::Uninstall { .. } => cmd_uninstall(settings, &request),
        Subcommand::Agent { json } => cmd_agent(settings, &request, *json),
    }
}

/// Dispatch against the real system: spawned processes, `PATH`, the terminal.
pub(crate) fn dispatch(settings: &Settings, request: &Request) -> Result<Outcome> {
    let overrides = EnvOverride::from_env(
        settings.options.agent.clone(),
        settings.config.agent.clone(),
    );
    let dispatcher = Dispatcher::new(
        settings,
        Collaborators {
            runner: &ProcessRunner,
            versions: &ProcessVersionReporter,
            input: &TerminalInput,
            overrides: &overrides,
            prober: PathProber::new(),
        },
    );

    match dispatcher.dispatch(request) {
        Ok(outcome) => Ok(outcome),
        // The manager already explained itself; only its exit code is left to pass on.
        Err(DispatchError::CommandFailed {
            command,
            code: Some(code),
        }) => {
            tracing::debug!(%command, code, "command failed");
            exit(code)
        }
        Err(e) => Err(with_suggestion(e)),
    }
}

/// Print what a dispatch did, for the intents that run a command.
pub(crate) fn report(outcome: &Outcome) {
    match outcome {
        Outcome::Planned { command, .. } => output::log_planned(command),
        Outcome::Dispatched { .. } | Outcome::Skipped { .. } | Outcome::Reported(_) => {}
    }
}

fn with_suggestion(err: DispatchError) -> Report {
    let suggestion = match &err {
        DispatchError::Detect(
            DetectError::InvalidOverride { .. } | DetectError::UnknownManager { .. },
        ) => Some(format!(
            "Use one of: {}",
            ManagerName::ACCEPTED.iter().join(", ")
        )),
        DispatchError::Detect(DetectError::NoManagerDetected) => Some(format!(
            "Commit a lockfile, install a package manager, or set --agent / {ENV_VAR}"
        )),
        DispatchError::Interactive(InteractiveError::Invalid { .. }) => {
            Some(format!("Type a command such as `npm install`, in the form {EXPECTED}"))
        }
        DispatchError::Interactive(InteractiveError::Cancelled) => {
            Some("Pass --agent <name> to skip the prompt".to_string())
        }
        DispatchError::Render(RenderError::MissingParameter { parameter, .. }) => {
            Some(format!("Pass a {parameter} name"))
        }
        _ => None,
    };
    let report = Report::new(err);
    match suggestion {
        Some(suggestion) => report.suggestion(suggestion),
        None => report,
    }
}
