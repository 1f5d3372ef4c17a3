//! The intent dispatcher.
//!
//! One dispatch walks `Start → detection states → Resolved → Rendering →
//! (CacheCheck) → Dispatched`, or stops in `Failed`. Every state entered is
//! appended to a trace so the walk can be inspected.

use crate::agent::Intent;
use crate::cache::DepsCache;
use crate::config::Settings;
use crate::detect::{DetectionResult, DetectionSource, Detector, Step};
use crate::env_override::OverrideSource;
use crate::error::{DetectError, DispatchError};
use crate::interactive;
use crate::output;
use crate::probe::PathProber;
use crate::registry::{Params, Registry};
use crate::system::{CommandLine, CommandRunner, TextInput, VersionReporter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Start,
    CheckingOverride,
    CheckingPin,
    DetectingLockfile,
    DisambiguatingVersion,
    DetectingPath,
    AwaitingInteractive,
    Resolved,
    Rendering,
    CacheCheck,
    Dispatched,
    Failed,
}

impl From<Step> for DispatchState {
    fn from(step: Step) -> Self {
        match step {
            Step::Attempt(DetectionSource::EnvironmentOverride) => DispatchState::CheckingOverride,
            Step::Attempt(DetectionSource::RuntimePin) => DispatchState::CheckingPin,
            Step::Attempt(DetectionSource::Lockfile) => DispatchState::DetectingLockfile,
            Step::Attempt(DetectionSource::Path) => DispatchState::DetectingPath,
            Step::Attempt(DetectionSource::Interactive) => DispatchState::AwaitingInteractive,
            Step::DisambiguatingYarn => DispatchState::DisambiguatingVersion,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub intent: Intent,
    pub params: Params,
}

impl Request {
    pub fn new(intent: Intent, params: Params) -> Self {
        Self { intent, params }
    }

    /// Only a plain install or a clean install can be made redundant by an unchanged digest.
    fn skippable(&self) -> bool {
        match self.intent {
            Intent::Install => self.params.packages.is_empty(),
            Intent::CleanInstall => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// `agent`: what was detected.
    Reported(DetectionResult),
    /// The command ran and succeeded. `detection` is `None` for a command typed by the user.
    Dispatched {
        command: CommandLine,
        detection: Option<DetectionResult>,
    },
    /// Dry run: the command that would have run.
    Planned {
        command: CommandLine,
        detection: Option<DetectionResult>,
    },
    /// Dependencies unchanged since the last install.
    Skipped {
        command: CommandLine,
        detection: DetectionResult,
    },
}

/// The outside world, as seen by a dispatch.
pub struct Collaborators<'a> {
    pub runner: &'a dyn CommandRunner,
    pub versions: &'a dyn VersionReporter,
    pub input: &'a dyn TextInput,
    pub overrides: &'a dyn OverrideSource,
    pub prober: PathProber,
}

pub struct Dispatcher<'a> {
    settings: &'a Settings,
    runner: &'a dyn CommandRunner,
    input: &'a dyn TextInput,
    detector: Detector<'a>,
    registry: &'a Registry,
}

impl<'a> Dispatcher<'a> {
    pub fn new(settings: &'a Settings, collaborators: Collaborators<'a>) -> Self {
        let detector = Detector::new(
            settings,
            collaborators.overrides,
            collaborators.versions,
            collaborators.prober,
        );
        Self {
            settings,
            runner: collaborators.runner,
            input: collaborators.input,
            detector,
            registry: Registry::builtin(),
        }
    }

    pub fn dispatch(&self, request: &Request) -> Result<Outcome, DispatchError> {
        let mut trace = Vec::new();
        let result = self.dispatch_traced(request, &mut trace);
        tracing::debug!(?trace, "dispatch finished");
        result
    }

    /// Like [`Dispatcher::dispatch`], recording every state entered into `trace`.
    pub fn dispatch_traced(
        &self,
        request: &Request,
        trace: &mut Vec<DispatchState>,
    ) -> Result<Outcome, DispatchError> {
        let result = self.walk(request, trace);
        trace.push(match result {
            Ok(_) => DispatchState::Dispatched,
            Err(_) => DispatchState::Failed,
        });
        result
    }

    fn walk(
        &self,
        request: &Request,
        trace: &mut Vec<DispatchState>,
    ) -> Result<Outcome, DispatchError> {
        trace.push(DispatchState::Start);

        let mut steps = Vec::new();
        let detected = self.detector.detect(&self.settings.project_dir, &mut steps);
        trace.extend(steps.into_iter().map(DispatchState::from));

        match detected? {
            Some(detection) => {
                trace.push(DispatchState::Resolved);
                self.dispatch_detected(request, detection, trace)
            }
            None if request.intent == Intent::Agent => Err(DetectError::NoManagerDetected.into()),
            None => {
                trace.push(DispatchState::AwaitingInteractive);
                let command = interactive::resolve(self.input)?;
                trace.push(DispatchState::Resolved);
                if self.settings.options.dry_run {
                    return Ok(Outcome::Planned {
                        command,
                        detection: None,
                    });
                }
                self.execute(&command)?;
                Ok(Outcome::Dispatched {
                    command,
                    detection: None,
                })
            }
        }
    }

    fn dispatch_detected(
        &self,
        request: &Request,
        detection: DetectionResult,
        trace: &mut Vec<DispatchState>,
    ) -> Result<Outcome, DispatchError> {
        if request.intent == Intent::Agent {
            return Ok(Outcome::Reported(detection));
        }

        trace.push(DispatchState::Rendering);
        let command = self
            .registry
            .render(detection.dialect, request.intent, &request.params)?;

        if self.settings.options.dry_run {
            return Ok(Outcome::Planned {
                command,
                detection: Some(detection),
            });
        }

        let cache = DepsCache::new(&self.settings.project_dir, self.settings.hash_file());
        if request.skippable() {
            trace.push(DispatchState::CacheCheck);
            if self.dependencies_unchanged(&cache) {
                output::log_skipped(&command);
                return Ok(Outcome::Skipped { command, detection });
            }
        } else if matches!(request.intent, Intent::Run | Intent::Exec)
            && self.settings.config.install_before_run
        {
            trace.push(DispatchState::CacheCheck);
            if !self.dependencies_unchanged(&cache) {
                let install = self
                    .registry
                    .render(detection.dialect, Intent::Install, &Params::default())?;
                self.execute(&install)?;
                refresh_hash(&cache);
            }
        }

        self.execute(&command)?;
        if request.intent.touches_dependencies() {
            refresh_hash(&cache);
        }

        Ok(Outcome::Dispatched {
            command,
            detection: Some(detection),
        })
    }

    /// True when the stored digest matches the current manifest and lockfile and `--force` is off.
    fn dependencies_unchanged(&self, cache: &DepsCache) -> bool {
        if self.settings.options.force {
            return false;
        }
        match cache.compute_hash() {
            Ok(fresh) => cache.is_current(&fresh),
            Err(e) => {
                tracing::warn!(%e, "could not hash dependencies");
                false
            }
        }
    }

    fn execute(&self, command: &CommandLine) -> Result<(), DispatchError> {
        output::log_running(command);
        let status = self
            .runner
            .run(command, &self.settings.project_dir)
            .map_err(|source| DispatchError::Spawn {
                command: command.to_string(),
                source,
            })?;
        if !status.success {
            return Err(DispatchError::CommandFailed {
                command: command.to_string(),
                code: status.code,
            });
        }
        Ok(())
    }
}

/// Store the post-install digest. Failure is reported and otherwise ignored.
fn refresh_hash(cache: &DepsCache) {
    let result = cache
        .compute_hash()
        .map_err(|e| e.to_string())
        .and_then(|hash| cache.write_stored_hash(&hash).map_err(|e| e.to_string()));
    if let Err(e) = result {
        tracing::warn!("{e}");
        output::log_warning(&format!(
            "could not record dependency state in {}: {e}",
            cache.hash_file().display()
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Dialect;
    use crate::config::{Config, RunOptions};
    use crate::env_override::EnvOverride;
    use crate::error::InteractiveError;
    use crate::system::testing::{FixedVersion, RecordingRunner, ScriptedInput};
    use crate::system::RunStatus;
    use std::fs;
    use std::path::Path;
    use tempfile::{tempdir, TempDir};
    use DispatchState::*;

    struct Fixture {
        dir: TempDir,
        bin: TempDir,
        runner: RecordingRunner,
        versions: FixedVersion,
        input: ScriptedInput,
        overrides: EnvOverride,
        options: RunOptions,
        config: Config,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                dir: tempdir().unwrap(),
                bin: tempdir().unwrap(),
                runner: RecordingRunner::succeeding(),
                versions: FixedVersion::failing(),
                input: ScriptedInput::default(),
                overrides: EnvOverride::default(),
                options: RunOptions::default(),
                config: Config::default(),
            }
        }

        fn npm_project() -> Self {
            let fixture = Self::new();
            fixture.file("package.json", r#"{"dependencies":{"react":"^18.2.0"}}"#);
            fixture.file("package-lock.json", "{}");
            fixture
        }

        fn file(&self, name: &str, contents: &str) {
            fs::write(self.dir.path().join(name), contents).unwrap();
        }

        fn cache(&self) -> DepsCache {
            DepsCache::new(self.dir.path(), self.config.hash_file.as_path())
        }

        fn dispatch(
            &self,
            request: Request,
        ) -> (Result<Outcome, DispatchError>, Vec<DispatchState>) {
            let settings = Settings::new(
                self.dir.path().to_path_buf(),
                self.options.clone(),
                self.config.clone(),
            );
            let dispatcher = Dispatcher::new(
                &settings,
                Collaborators {
                    runner: &self.runner,
                    versions: &self.versions,
                    input: &self.input,
                    overrides: &self.overrides,
                    prober: PathProber::with_search_path(self.bin.path()),
                },
            );
            let mut trace = Vec::new();
            let result = dispatcher.dispatch_traced(&request, &mut trace);
            (result, trace)
        }

        fn commands(&self) -> Vec<String> {
            self.runner
                .commands()
                .iter()
                .map(ToString::to_string)
                .collect()
        }
    }

    fn install() -> Request {
        Request::new(Intent::Install, Params::default())
    }

    #[cfg(unix)]
    fn stub_binary(dir: &Path, name: &str) {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join(name);
        fs::write(&path, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[test]
    fn scenario_a_npm_lockfile_install_package() {
        let fixture = Fixture::npm_project();

        let (result, trace) =
            fixture.dispatch(Request::new(Intent::Install, Params::with_packages(["react"])));

        let expected = crate::registry::render(
            Dialect::Npm,
            Intent::Install,
            &Params::with_packages(["react"]),
        )
        .unwrap();
        match result.unwrap() {
            Outcome::Dispatched { command, detection } => {
                assert_eq!(command, expected);
                let detection = detection.unwrap();
                assert_eq!(detection.dialect, Dialect::Npm);
                assert_eq!(detection.source, DetectionSource::Lockfile);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(fixture.commands(), vec!["npm install react"]);
        assert_eq!(
            trace,
            vec![Start, CheckingOverride, DetectingLockfile, Resolved, Rendering, Dispatched]
        );
    }

    #[cfg(unix)]
    #[test]
    fn scenario_b_yarn_classic_on_path() {
        let mut fixture = Fixture::new();
        stub_binary(fixture.bin.path(), "yarn");
        fixture.versions = FixedVersion::reporting("1.22.19");

        let (result, trace) = fixture.dispatch(Request::new(Intent::Agent, Params::default()));
        match result.unwrap() {
            Outcome::Reported(detection) => {
                assert_eq!(detection.dialect, Dialect::YarnClassic);
                assert_eq!(detection.source, DetectionSource::Path);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(
            trace,
            vec![
                Start,
                CheckingOverride,
                DetectingLockfile,
                DetectingPath,
                DisambiguatingVersion,
                Resolved,
                Dispatched
            ]
        );
        assert!(fixture.commands().is_empty());
    }

    #[test]
    fn scenario_c_interactive_validation_failure() {
        let mut fixture = Fixture::new();
        fixture.input = ScriptedInput::replying("please just install it");

        let (result, trace) = fixture.dispatch(install());
        assert!(matches!(
            result,
            Err(DispatchError::Interactive(InteractiveError::Invalid { .. }))
        ));
        assert_eq!(fixture.input.prompts.get(), 1);
        assert!(fixture.commands().is_empty());
        assert_eq!(trace.last(), Some(&Failed));
        assert!(trace.contains(&AwaitingInteractive));
        assert!(!trace.contains(&Resolved));
    }

    #[test]
    fn scenario_d_unchanged_dependencies_skip_install() {
        let fixture = Fixture::npm_project();
        let cache = fixture.cache();
        cache.write_stored_hash(&cache.compute_hash().unwrap()).unwrap();

        let (result, trace) = fixture.dispatch(install());
        assert!(matches!(result.unwrap(), Outcome::Skipped { .. }));
        assert!(fixture.commands().is_empty());
        assert!(trace.contains(&CacheCheck));
    }

    #[test]
    fn scenario_d_force_still_installs() {
        let mut fixture = Fixture::npm_project();
        fixture.options.force = true;
        let cache = fixture.cache();
        cache.write_stored_hash(&cache.compute_hash().unwrap()).unwrap();

        let (result, _) = fixture.dispatch(install());
        assert!(matches!(result.unwrap(), Outcome::Dispatched { .. }));
        assert_eq!(fixture.commands(), vec!["npm install"]);
    }

    #[test]
    fn test_changed_dependencies_install_and_store_hash() {
        let fixture = Fixture::npm_project();
        let cache = fixture.cache();
        cache.write_stored_hash("stale").unwrap();

        let (result, _) = fixture.dispatch(install());
        assert!(matches!(result.unwrap(), Outcome::Dispatched { .. }));
        assert_eq!(fixture.commands(), vec!["npm install"]);
        assert_eq!(cache.read_stored_hash(), Some(cache.compute_hash().unwrap()));

        let (result, _) = fixture.dispatch(install());
        assert!(matches!(result.unwrap(), Outcome::Skipped { .. }));
        assert_eq!(fixture.commands().len(), 1);
    }

    #[test]
    fn test_unwritable_hash_does_not_fail_install() {
        let mut fixture = Fixture::npm_project();
        fixture.file("blocker", "");
        fixture.config.hash_file = "blocker/deps-hash".into();

        let (result, trace) = fixture.dispatch(install());
        assert!(matches!(result.unwrap(), Outcome::Dispatched { .. }));
        assert_eq!(fixture.commands(), vec!["npm install"]);
        assert_eq!(fixture.cache().read_stored_hash(), None);
        assert_eq!(trace.last(), Some(&Dispatched));
    }

    #[test]
    fn test_unreadable_hash_counts_as_changed() {
        let fixture = Fixture::npm_project();
        fs::create_dir_all(fixture.cache().hash_file()).unwrap();

        let (result, _) = fixture.dispatch(install());
        assert!(matches!(result.unwrap(), Outcome::Dispatched { .. }));
        assert_eq!(fixture.commands(), vec!["npm install"]);
    }

    #[test]
    fn test_failed_install_keeps_old_hash() {
        let mut fixture = Fixture::npm_project();
        fixture.runner = RecordingRunner::with_status(RunStatus {
            success: false,
            code: Some(1),
        });

        let (result, trace) = fixture.dispatch(install());
        match result {
            Err(DispatchError::CommandFailed { command, code }) => {
                assert_eq!(command, "npm install");
                assert_eq!(code, Some(1));
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(fixture.cache().read_stored_hash(), None);
        assert_eq!(trace.last(), Some(&Failed));
    }

    #[test]
    fn test_adding_a_package_never_skips() {
        let fixture = Fixture::npm_project();
        let cache = fixture.cache();
        cache.write_stored_hash(&cache.compute_hash().unwrap()).unwrap();

        let (result, trace) =
            fixture.dispatch(Request::new(Intent::Install, Params::with_packages(["lodash"])));
        assert!(matches!(result.unwrap(), Outcome::Dispatched { .. }));
        assert!(!trace.contains(&CacheCheck));
    }

    #[test]
    fn test_override_wins_over_lockfile() {
        let mut fixture = Fixture::npm_project();
        fixture.overrides = EnvOverride::new(Some("bun".into()), None, None);

        let (result, _) = fixture.dispatch(Request::new(
            Intent::Run,
            Params {
                script: Some("dev".into()),
                ..Default::default()
            },
        ));
        assert!(result.is_ok());
        assert_eq!(fixture.commands(), vec!["bun run dev"]);
    }

    #[test]
    fn test_invalid_override_stops_immediately() {
        let mut fixture = Fixture::npm_project();
        fixture.overrides = EnvOverride::new(None, Some("cargo".into()), None);

        let (result, trace) = fixture.dispatch(install());
        assert!(matches!(
            result,
            Err(DispatchError::Detect(DetectError::InvalidOverride { .. }))
        ));
        assert_eq!(trace, vec![Start, CheckingOverride, Failed]);
        assert!(fixture.commands().is_empty());
    }

    #[test]
    fn test_interactive_command_runs_verbatim() {
        let mut fixture = Fixture::new();
        fixture.input = ScriptedInput::replying("pnpm add -D vitest");

        let (result, _) = fixture.dispatch(install());
        match result.unwrap() {
            Outcome::Dispatched { command, detection } => {
                assert_eq!(command.to_string(), "pnpm add -D vitest");
                assert_eq!(detection, None);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(fixture.commands(), vec!["pnpm add -D vitest"]);
    }

    #[test]
    fn test_agent_without_manager_does_not_prompt() {
        let fixture = Fixture::new();
        let (result, _) = fixture.dispatch(Request::new(Intent::Agent, Params::default()));
        assert!(matches!(
            result,
            Err(DispatchError::Detect(DetectError::NoManagerDetected))
        ));
        assert_eq!(fixture.input.prompts.get(), 0);
    }

    #[test]
    fn test_dry_run_executes_nothing() {
        let mut fixture = Fixture::npm_project();
        fixture.options.dry_run = true;

        let (result, _) = fixture.dispatch(Request::new(Intent::CleanInstall, Params::default()));
        match result.unwrap() {
            Outcome::Planned { command, .. } => assert_eq!(command.to_string(), "npm ci"),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(fixture.commands().is_empty());
        assert_eq!(fixture.cache().read_stored_hash(), None);
    }

    #[test]
    fn test_missing_parameter_fails_before_running() {
        let fixture = Fixture::npm_project();
        let (result, trace) = fixture.dispatch(Request::new(Intent::Run, Params::default()));
        assert!(matches!(result, Err(DispatchError::Render(_))));
        assert_eq!(trace[trace.len() - 2..], [Rendering, Failed]);
        assert!(fixture.commands().is_empty());
    }

    #[test]
    fn test_install_before_run() {
        let mut fixture = Fixture::npm_project();
        fixture.config.install_before_run = true;
        let run = Request::new(
            Intent::Run,
            Params {
                script: Some("build".into()),
                ..Default::default()
            },
        );

        let (result, _) = fixture.dispatch(run.clone());
        assert!(result.is_ok());
        assert_eq!(fixture.commands(), vec!["npm install", "npm run build"]);

        let (result, _) = fixture.dispatch(run);
        assert!(result.is_ok());
        assert_eq!(
            fixture.commands(),
            vec!["npm install", "npm run build", "npm run build"]
        );
    }

    #[test]
    fn test_uninstall_refreshes_hash() {
        let fixture = Fixture::npm_project();
        let (result, _) =
            fixture.dispatch(Request::new(Intent::Uninstall, Params::with_packages(["react"])));
        assert!(result.is_ok());
        assert_eq!(fixture.commands(), vec!["npm uninstall react"]);
        assert!(fixture.cache().read_stored_hash().is_some());
    }
}
