//! Explicit manager override.
//!
//! Sources, strongest first: the `--agent` flag, the `ANYPM_AGENT` environment
//! variable, the `agent` key of the config file.

use std::env;

use crate::agent::ManagerName;
use crate::error::DetectError;

pub const ENV_VAR: &str = "ANYPM_AGENT";

/// A manager name exactly as the user wrote it, plus where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestedManager {
    pub value: String,
    pub origin: &'static str,
}

pub trait OverrideSource {
    fn requested(&self) -> Option<RequestedManager>;
}

#[derive(Debug, Clone, Default)]
pub struct EnvOverride {
    flag: Option<String>,
    env: Option<String>,
    config: Option<String>,
}

impl EnvOverride {
    pub fn new(flag: Option<String>, env: Option<String>, config: Option<String>) -> Self {
        Self { flag, env, config }
    }

    /// Reads [`ENV_VAR`] from the process environment.
    pub fn from_env(flag: Option<String>, config: Option<String>) -> Self {
        Self::new(flag, env::var(ENV_VAR).ok(), config)
    }
}

fn non_empty(value: &Option<String>, origin: &'static str) -> Option<RequestedManager> {
    let value = value.as_deref()?.trim();
    (!value.is_empty()).then(|| RequestedManager {
        value: value.to_string(),
        origin,
    })
}

impl OverrideSource for EnvOverride {
    fn requested(&self) -> Option<RequestedManager> {
        non_empty(&self.flag, "--agent")
            .or_else(|| non_empty(&self.env, ENV_VAR))
            .or_else(|| non_empty(&self.config, "config key `agent`"))
    }
}

/// The overriding manager, if any. A value that names no known manager is fatal.
pub fn resolve_override(source: &dyn OverrideSource) -> Result<Option<ManagerName>, DetectError> {
    let Some(requested) = source.requested() else {
        return Ok(None);
    };
    requested
        .value
        .parse()
        .map(Some)
        .map_err(|_| DetectError::InvalidOverride {
            value: requested.value,
            origin: requested.origin,
        })
}
