//! anypm - one command set for every JavaScript package manager.
//!
//! Figures out which manager a project uses (override, lockfile, `PATH`, or
//! by asking) and translates a small set of intents into that manager's
//! command line.

pub mod agent;
pub mod cache;
pub mod cli;
pub mod commands;
pub mod config;
pub mod detect;
pub mod dispatch;
pub mod env_override;
pub mod error;
pub mod interactive;
pub mod lockfile;
pub mod output;
pub mod pin;
pub mod probe;
pub mod registry;
pub mod system;
pub mod version;

pub use agent::{Dialect, Intent, ManagerName};
pub use cli::{Args, Subcommand};
pub use commands::execute_command;
pub use config::{Config, RunOptions, Settings};
pub use detect::{DetectionResult, DetectionSource, Detector};
pub use dispatch::{Collaborators, DispatchState, Dispatcher, Outcome, Request};
pub use error::DispatchError;
pub use registry::{Params, Registry};

// ---

use color_eyre::eyre::Result;

pub fn package_manager(args: &Args) -> Result<()> {
    color_eyre::install()?;
    let project_dir = match &args.working_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir()?,
    };
    let settings = Settings::load(project_dir, args.run_options())?;
    tracing::debug!(
        project = %settings.project_dir.display(),
        version = settings.build.version,
        "starting"
    );
    execute_command(&args.cmd, &settings)
}
