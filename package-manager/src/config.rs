//! Configuration file and the immutable settings built from it at startup.

use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::cache::DEFAULT_HASH_FILE;
use crate::error::ConfigError;

pub const CONFIG_FILE: &str = ".anypm.toml";

/// `.anypm.toml`, read from the project directory or the home directory.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    /// Manager to use regardless of what is detected.
    pub agent: Option<String>,
    /// Let a runtime pin that names a manager outrank lockfile and PATH detection.
    pub pin_overrides: bool,
    /// Install (when dependencies changed) before `run` and `exec`.
    pub install_before_run: bool,
    /// Where the dependency digest lives, relative to the project directory.
    pub hash_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            agent: None,
            pin_overrides: false,
            install_before_run: false,
            hash_file: PathBuf::from(DEFAULT_HASH_FILE),
        }
    }
}

impl Config {
    pub fn parse(path: &Path, text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read `path`; `Ok(None)` if it does not exist.
    pub fn read(path: &Path) -> Result<Option<Self>, ConfigError> {
        match fs::read_to_string(path) {
            Ok(text) => Self::parse(path, &text).map(Some),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// The project's config, else the user's, else defaults.
    pub fn load(project_dir: &Path, home_dir: Option<&Path>) -> Result<Self, ConfigError> {
        let candidates = std::iter::once(project_dir.join(CONFIG_FILE))
            .chain(home_dir.map(|home| home.join(CONFIG_FILE)));
        for path in candidates {
            if let Some(config) = Self::read(&path)? {
                tracing::debug!(path = %path.display(), "loaded config");
                return Ok(config);
            }
        }
        Ok(Self::default())
    }
}

/// Name and version of this build, fixed at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildInfo {
    pub name: &'static str,
    pub version: &'static str,
}

impl BuildInfo {
    pub const CURRENT: BuildInfo = BuildInfo {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    };
}

/// Switches that change how a dispatch behaves, taken from the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    pub dry_run: bool,
    /// Install even when the dependency digest is unchanged.
    pub force: bool,
    pub agent: Option<String>,
}

/// Everything a dispatch needs to know, built once per invocation and never mutated.
#[derive(Debug, Clone)]
pub struct Settings {
    pub project_dir: PathBuf,
    pub build: BuildInfo,
    pub options: RunOptions,
    pub config: Config,
}

impl Settings {
    pub fn new(project_dir: PathBuf, options: RunOptions, config: Config) -> Self {
        Self {
            project_dir,
            build: BuildInfo::CURRENT,
            options,
            config,
        }
    }

    /// Load the config for `project_dir` from disk.
    pub fn load(project_dir: PathBuf, options: RunOptions) -> Result<Self, ConfigError> {
        let config = Config::load(&project_dir, home::home_dir().as_deref())?;
        Ok(Self::new(project_dir, options, config))
    }

    pub fn hash_file(&self) -> &Path {
        &self.config.hash_file
    }
}
