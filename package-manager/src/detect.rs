//! Manager detection as an ordered list of strategies.
//!
//! Each strategy either finds a dialect, reports nothing (the next one runs),
//! or fails fatally. Order is precedence: override, optional pin, lockfile, PATH.

use serde::Serialize;
use std::fmt;
use std::path::Path;

use crate::agent::{Dialect, ManagerName};
use crate::config::Settings;
use crate::env_override::{resolve_override, OverrideSource};
use crate::error::{DetectError, VersionError};
use crate::lockfile::{self, LockfileKind};
use crate::pin::{self, RuntimePin};
use crate::probe::PathProber;
use crate::system::VersionReporter;
use crate::version::probe_yarn;

/// How the dialect was chosen. Diagnostic only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DetectionSource {
    Lockfile,
    Path,
    EnvironmentOverride,
    RuntimePin,
    Interactive,
}

impl DetectionSource {
    /// Same spelling as the serialized form.
    pub fn name(self) -> &'static str {
        match self {
            DetectionSource::Lockfile => "lockfile",
            DetectionSource::Path => "path",
            DetectionSource::EnvironmentOverride => "environment-override",
            DetectionSource::RuntimePin => "runtime-pin",
            DetectionSource::Interactive => "interactive",
        }
    }
}

impl fmt::Display for DetectionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The outcome of detection for one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetectionResult {
    pub dialect: Dialect,
    pub source: DetectionSource,
    pub lockfile: Option<LockfileKind>,
    /// Present whenever the project pins its toolchain, whatever chose the dialect.
    pub pin: Option<RuntimePin>,
}

/// What a strategy found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Found {
    pub dialect: Dialect,
    pub lockfile: Option<LockfileKind>,
}

impl Found {
    fn dialect(dialect: Dialect) -> Self {
        Self {
            dialect,
            lockfile: None,
        }
    }
}

/// Observable progress through detection, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Attempt(DetectionSource),
    DisambiguatingYarn,
}

pub struct DetectContext<'a> {
    pub project_dir: &'a Path,
    pub versions: &'a dyn VersionReporter,
    pub pin: Option<&'a RuntimePin>,
}

impl DetectContext<'_> {
    fn resolve(
        &self,
        manager: ManagerName,
        steps: &mut Vec<Step>,
    ) -> Result<Dialect, VersionError> {
        match manager {
            ManagerName::Exact(dialect) => Ok(dialect),
            ManagerName::Yarn => {
                steps.push(Step::DisambiguatingYarn);
                probe_yarn(self.versions, self.project_dir)
            }
        }
    }
}

pub trait DetectionStrategy {
    fn source(&self) -> DetectionSource;

    fn detect(
        &self,
        cx: &DetectContext<'_>,
        steps: &mut Vec<Step>,
    ) -> Result<Option<Found>, DetectError>;
}

/// `--agent`, `ANYPM_AGENT`, config `agent`.
pub struct OverrideStrategy<'a> {
    source: &'a dyn OverrideSource,
}

impl<'a> OverrideStrategy<'a> {
    pub fn new(source: &'a dyn OverrideSource) -> Self {
        Self { source }
    }
}

impl DetectionStrategy for OverrideStrategy<'_> {
    fn source(&self) -> DetectionSource {
        DetectionSource::EnvironmentOverride
    }

    fn detect(
        &self,
        cx: &DetectContext<'_>,
        steps: &mut Vec<Step>,
    ) -> Result<Option<Found>, DetectError> {
        let Some(manager) = resolve_override(self.source)? else {
            return Ok(None);
        };
        // The user asked for yarn; other sources must not second-guess that.
        let dialect = cx.resolve(manager, steps).unwrap_or_else(|e| {
            tracing::warn!("{e}, assuming yarn 1.x");
            Dialect::YarnClassic
        });
        Ok(Some(Found::dialect(dialect)))
    }
}

/// A runtime pin that names a manager. Only listed when `pin-overrides` is on.
pub struct PinStrategy;

impl DetectionStrategy for PinStrategy {
    fn source(&self) -> DetectionSource {
        DetectionSource::RuntimePin
    }

    fn detect(
        &self,
        cx: &DetectContext<'_>,
        _steps: &mut Vec<Step>,
    ) -> Result<Option<Found>, DetectError> {
        Ok(cx.pin.and_then(RuntimePin::dialect).map(Found::dialect))
    }
}

pub struct LockfileStrategy;

impl DetectionStrategy for LockfileStrategy {
    fn source(&self) -> DetectionSource {
        DetectionSource::Lockfile
    }

    fn detect(
        &self,
        cx: &DetectContext<'_>,
        steps: &mut Vec<Step>,
    ) -> Result<Option<Found>, DetectError> {
        let Some(found) = lockfile::scan(cx.project_dir) else {
            return Ok(None);
        };
        match cx.resolve(found.kind.manager(), steps) {
            Ok(dialect) => Ok(Some(Found {
                dialect,
                lockfile: Some(found.kind),
            })),
            Err(e) => {
                tracing::warn!(lockfile = %found.kind, "{e}, trying other sources");
                Ok(None)
            }
        }
    }
}

pub struct PathStrategy {
    prober: PathProber,
}

impl PathStrategy {
    pub fn new(prober: PathProber) -> Self {
        Self { prober }
    }
}

impl DetectionStrategy for PathStrategy {
    fn source(&self) -> DetectionSource {
        DetectionSource::Path
    }

    fn detect(
        &self,
        cx: &DetectContext<'_>,
        steps: &mut Vec<Step>,
    ) -> Result<Option<Found>, DetectError> {
        for binary in self.prober.find_all(cx.project_dir) {
            match cx.resolve(binary.manager, steps) {
                Ok(dialect) => return Ok(Some(Found::dialect(dialect))),
                Err(e) => {
                    tracing::warn!(
                        path = %binary.path.display(),
                        "{e}, trying next manager on PATH"
                    );
                }
            }
        }
        Ok(None)
    }
}

/// Runs strategies in order until one finds a dialect.
pub struct Detector<'a> {
    strategies: Vec<Box<dyn DetectionStrategy + 'a>>,
    versions: &'a dyn VersionReporter,
}

impl<'a> Detector<'a> {
    pub fn with_strategies(
        strategies: Vec<Box<dyn DetectionStrategy + 'a>>,
        versions: &'a dyn VersionReporter,
    ) -> Self {
        Self {
            strategies,
            versions,
        }
    }

    /// The standard precedence for `settings`.
    pub fn new(
        settings: &Settings,
        overrides: &'a dyn OverrideSource,
        versions: &'a dyn VersionReporter,
        prober: PathProber,
    ) -> Self {
        let mut strategies: Vec<Box<dyn DetectionStrategy + 'a>> =
            vec![Box::new(OverrideStrategy::new(overrides))];
        if settings.config.pin_overrides {
            strategies.push(Box::new(PinStrategy));
        }
        strategies.push(Box::new(LockfileStrategy));
        strategies.push(Box::new(PathStrategy::new(prober)));
        Self::with_strategies(strategies, versions)
    }

    /// `Ok(None)` when every strategy came up empty.
    pub fn detect(
        &self,
        project_dir: &Path,
        steps: &mut Vec<Step>,
    ) -> Result<Option<DetectionResult>, DetectError> {
        let pin = pin::detect(project_dir);
        if let Some(pin) = &pin {
            tracing::debug!(?pin, "runtime pin present");
        }
        let cx = DetectContext {
            project_dir,
            versions: self.versions,
            pin: pin.as_ref(),
        };

        for strategy in &self.strategies {
            let source = strategy.source();
            steps.push(Step::Attempt(source));
            match strategy.detect(&cx, steps)? {
                Some(found) => {
                    tracing::debug!(?source, dialect = %found.dialect, "detected");
                    return Ok(Some(DetectionResult {
                        dialect: found.dialect,
                        source,
                        lockfile: found.lockfile,
                        pin,
                    }));
                }
                None => tracing::debug!(?source, "nothing found"),
            }
        }
        Ok(None)
    }
}
