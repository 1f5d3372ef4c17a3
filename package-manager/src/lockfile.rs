//! Lockfile scanning.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::agent::{Dialect, ManagerName};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LockfileKind {
    BunText,
    BunBinary,
    Deno,
    Pnpm,
    PnpmWorkspace,
    Yarn,
    Npm,
    NpmShrinkwrap,
}

impl LockfileKind {
    /// Scan order. The first file present wins.
    pub const PRIORITY: [LockfileKind; 8] = [
        LockfileKind::BunText,
        LockfileKind::BunBinary,
        LockfileKind::Deno,
        LockfileKind::Pnpm,
        LockfileKind::PnpmWorkspace,
        LockfileKind::Yarn,
        LockfileKind::Npm,
        LockfileKind::NpmShrinkwrap,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            LockfileKind::BunText => "bun.lock",
            LockfileKind::BunBinary => "bun.lockb",
            LockfileKind::Deno => "deno.lock",
            LockfileKind::Pnpm => "pnpm-lock.yaml",
            LockfileKind::PnpmWorkspace => "pnpm-workspace.yaml",
            LockfileKind::Yarn => "yarn.lock",
            LockfileKind::Npm => "package-lock.json",
            LockfileKind::NpmShrinkwrap => "npm-shrinkwrap.json",
        }
    }

    /// `yarn.lock` maps to [`ManagerName::Yarn`]; the dialect needs a version probe.
    pub fn manager(self) -> ManagerName {
        match self {
            LockfileKind::BunText | LockfileKind::BunBinary => ManagerName::Exact(Dialect::Bun),
            LockfileKind::Deno => ManagerName::Exact(Dialect::Deno),
            LockfileKind::Pnpm | LockfileKind::PnpmWorkspace => ManagerName::Exact(Dialect::Pnpm),
            LockfileKind::Yarn => ManagerName::Yarn,
            LockfileKind::Npm | LockfileKind::NpmShrinkwrap => ManagerName::Exact(Dialect::Npm),
        }
    }

    /// Whether the file records resolved dependencies, as opposed to workspace layout.
    pub fn pins_dependencies(self) -> bool {
        !matches!(self, LockfileKind::PnpmWorkspace)
    }
}

impl fmt::Display for LockfileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

/// A lockfile present in the project directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundLockfile {
    pub kind: LockfileKind,
    pub path: PathBuf,
}

/// Returns the first known lockfile in `project_dir`, by [`LockfileKind::PRIORITY`].
///
/// Only the directory itself is examined, never parents or children.
#[tracing::instrument(level = "debug")]
pub fn scan(project_dir: &Path) -> Option<FoundLockfile> {
    LockfileKind::PRIORITY.into_iter().find_map(|kind| {
        let path = project_dir.join(kind.file_name());
        path.is_file().then_some(FoundLockfile { kind, path })
    })
}

/// The lockfile whose bytes describe the installed dependency tree, if any.
pub fn dependency_lockfile(project_dir: &Path) -> Option<FoundLockfile> {
    LockfileKind::PRIORITY
        .into_iter()
        .filter(|kind| kind.pins_dependencies())
        .find_map(|kind| {
            let path = project_dir.join(kind.file_name());
            path.is_file().then_some(FoundLockfile { kind, path })
        })
}
