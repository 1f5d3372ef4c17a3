//! Command-line interface definitions for anypm.

use clap::Parser;
use compact_str::CompactString;
use std::path::PathBuf;

use crate::agent::Intent;
use crate::config::RunOptions;
use crate::dispatch::Request;
use crate::registry::Params;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// Print verbose logs
    #[clap(short, long, global = true)]
    pub verbose: bool,
    /// Run in a custom working directory
    #[clap(long, global = true, alias = "cwd")]
    pub working_dir: Option<PathBuf>,
    /// Use this package manager instead of detecting one
    #[clap(long, global = true, value_name = "MANAGER")]
    pub agent: Option<String>,
    /// Print the command instead of running it
    #[clap(long, global = true)]
    pub dry_run: bool,
    /// Install even when dependencies are unchanged
    #[clap(long, global = true)]
    pub force: bool,

    /// Subcommand to execute
    #[clap(subcommand)]
    pub cmd: Subcommand,
}

impl Args {
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            dry_run: self.dry_run,
            force: self.force,
            agent: self.agent.clone(),
        }
    }
}

/// Flags for the package manager itself go after `--` and are passed through in order.
#[derive(Parser, Debug, Clone)]
pub enum Subcommand {
    /// Install dependencies, or add packages when given
    #[clap(alias = "i", alias = "add")]
    Install {
        packages: Vec<CompactString>,
        #[clap(last = true)]
        args: Vec<String>,
    },
    /// Run a script defined in package.json
    Run {
        script: CompactString,
        #[clap(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Execute a binary from the project's dependencies
    Exec {
        bin: CompactString,
        #[clap(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Download (if needed) and execute a package
    #[clap(alias = "x")]
    Dlx {
        package: CompactString,
        #[clap(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Update dependencies, or only the given packages
    #[clap(alias = "upgrade")]
    Update {
        packages: Vec<CompactString>,
        #[clap(last = true)]
        args: Vec<String>,
    },
    /// Remove packages from package.json
    #[clap(alias = "remove", alias = "rm")]
    Uninstall {
        #[clap(required = true)]
        packages: Vec<CompactString>,
        #[clap(last = true)]
        args: Vec<String>,
    },
    /// Install exactly what the lockfile says
    #[clap(name = "clean-install", alias = "ci")]
    CleanInstall {
        #[clap(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Show which package manager would be used
    Agent {
        /// Print the detection result as JSON
        #[clap(long)]
        json: bool,
    },
}

impl Subcommand {
    pub fn intent(&self) -> Intent {
        match self {
            Subcommand::Install { .. } => Intent::Install,
            Subcommand::Run { .. } => Intent::Run,
            Subcommand::Exec { .. } => Intent::Exec,
            Subcommand::Dlx { .. } => Intent::Dlx,
            Subcommand::Update { .. } => Intent::Update,
            Subcommand::Uninstall { .. } => Intent::Uninstall,
            Subcommand::CleanInstall { .. } => Intent::CleanInstall,
            Subcommand::Agent { .. } => Intent::Agent,
        }
    }

    pub fn request(&self) -> Request {
        let params = match self {
            Subcommand::Install { packages, args }
            | Subcommand::Update { packages, args }
            | Subcommand::Uninstall { packages, args } => {
                Params::with_packages(packages.iter().cloned()).args(args.iter().cloned())
            }
            Subcommand::CleanInstall { args } => Params::default().args(args.iter().cloned()),
            Subcommand::Run { script, args } => Params {
                script: Some(script.clone()),
                args: args.clone(),
                ..Default::default()
            },
            Subcommand::Exec { bin: package, args } | Subcommand::Dlx { package, args } => {
                Params::with_packages([package.clone()]).args(args.iter().cloned())
            }
            Subcommand::Agent { .. } => Params::default(),
        };
        Request::new(self.intent(), params)
    }
}
