//! Package manager dialects and the intents users can express against them.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::error::DetectError;

/// A package manager plus the major-version variant whose command grammar it speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Dialect {
    Npm,
    YarnClassic,
    YarnModern,
    Pnpm,
    Bun,
    Deno,
}

impl Dialect {
    pub const ALL: [Dialect; 6] = [
        Dialect::Npm,
        Dialect::YarnClassic,
        Dialect::YarnModern,
        Dialect::Pnpm,
        Dialect::Bun,
        Dialect::Deno,
    ];

    /// The executable every template of this dialect is invoked through by default.
    pub fn executable(self) -> &'static str {
        match self {
            Dialect::Npm => "npm",
            Dialect::YarnClassic | Dialect::YarnModern => "yarn",
            Dialect::Pnpm => "pnpm",
            Dialect::Bun => "bun",
            Dialect::Deno => "deno",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Dialect::Npm => "npm",
            Dialect::YarnClassic => "yarn-classic",
            Dialect::YarnModern => "yarn-modern",
            Dialect::Pnpm => "pnpm",
            Dialect::Bun => "bun",
            Dialect::Deno => "deno",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A manager named by the user or a pin file.
///
/// Bare `yarn` is kept apart from the two yarn dialects because choosing
/// between them needs a version probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerName {
    Exact(Dialect),
    Yarn,
}

impl ManagerName {
    /// Names accepted wherever a user may spell out a manager.
    pub const ACCEPTED: &'static [&'static str] = &[
        "npm",
        "yarn",
        "yarn-classic",
        "yarn@classic",
        "yarn-modern",
        "yarn@berry",
        "pnpm",
        "bun",
        "deno",
    ];

    pub fn executable(self) -> &'static str {
        match self {
            ManagerName::Exact(dialect) => dialect.executable(),
            ManagerName::Yarn => "yarn",
        }
    }
}

impl FromStr for ManagerName {
    type Err = DetectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = match s.trim().to_ascii_lowercase().as_str() {
            "npm" => ManagerName::Exact(Dialect::Npm),
            "yarn" => ManagerName::Yarn,
            "yarn-classic" | "yarn@classic" => ManagerName::Exact(Dialect::YarnClassic),
            "yarn-modern" | "yarn@berry" => ManagerName::Exact(Dialect::YarnModern),
            "pnpm" => ManagerName::Exact(Dialect::Pnpm),
            "bun" => ManagerName::Exact(Dialect::Bun),
            "deno" => ManagerName::Exact(Dialect::Deno),
            _ => {
                return Err(DetectError::UnknownManager {
                    value: s.to_string(),
                })
            }
        };
        Ok(name)
    }
}

/// An abstract operation, independent of which manager performs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Intent {
    Install,
    Run,
    Exec,
    Dlx,
    Update,
    Uninstall,
    CleanInstall,
    /// Report the detected manager; never rendered into a command.
    Agent,
}

impl Intent {
    pub const ALL: [Intent; 8] = [
        Intent::Install,
        Intent::Run,
        Intent::Exec,
        Intent::Dlx,
        Intent::Update,
        Intent::Uninstall,
        Intent::CleanInstall,
        Intent::Agent,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Intent::Install => "install",
            Intent::Run => "run",
            Intent::Exec => "exec",
            Intent::Dlx => "dlx",
            Intent::Update => "update",
            Intent::Uninstall => "uninstall",
            Intent::CleanInstall => "clean-install",
            Intent::Agent => "agent",
        }
    }

    /// Intents whose success changes what is installed, so the stored digest is refreshed.
    pub fn touches_dependencies(self) -> bool {
        matches!(
            self,
            Intent::Install | Intent::CleanInstall | Intent::Update | Intent::Uninstall
        )
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
