//! PATH probing for installed managers.

use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::agent::{Dialect, ManagerName};

/// Probe order. `npm` ships with node, so it sits behind the managers people install on purpose.
pub const CANDIDATES: [ManagerName; 5] = [
    ManagerName::Exact(Dialect::Pnpm),
    ManagerName::Yarn,
    ManagerName::Exact(Dialect::Bun),
    ManagerName::Exact(Dialect::Npm),
    ManagerName::Exact(Dialect::Deno),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundBinary {
    pub manager: ManagerName,
    pub path: PathBuf,
}

/// Looks managers up on a search path without ever running them.
#[derive(Debug, Clone, Default)]
pub struct PathProber {
    /// Overrides `PATH`; `None` reads the process environment at probe time.
    search_path: Option<OsString>,
}

impl PathProber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search_path(search_path: impl Into<OsString>) -> Self {
        Self {
            search_path: Some(search_path.into()),
        }
    }

    /// Every candidate that resolves, in [`CANDIDATES`] order.
    pub fn find_all(&self, cwd: &Path) -> Vec<FoundBinary> {
        let search_path = self.search_path.clone().or_else(|| env::var_os("PATH"));
        let Some(search_path) = search_path else {
            return Vec::new();
        };

        CANDIDATES
            .into_iter()
            .filter_map(|manager| {
                match which::which_in(manager.executable(), Some(&search_path), cwd) {
                    Ok(path) => Some(FoundBinary { manager, path }),
                    Err(e) => {
                        tracing::trace!(executable = manager.executable(), %e, "not on PATH");
                        None
                    }
                }
            })
            .collect()
    }
}
