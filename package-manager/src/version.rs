//! Yarn version disambiguation.
//!
//! Yarn 1.x and yarn 2+ accept different command grammars for the same intent,
//! so a bare "yarn" from a lockfile or PATH must be classified before any
//! template can be rendered.

use semver::Version;
use std::path::Path;

use crate::agent::Dialect;
use crate::error::VersionError;
use crate::system::VersionReporter;

/// Parse a reported version, tolerating a leading `v` and surrounding whitespace.
pub fn parse_version(output: &str) -> Result<Version, VersionError> {
    let trimmed = output.trim();
    let candidate = trimmed.strip_prefix('v').unwrap_or(trimmed);
    Version::parse(candidate).map_err(|_| VersionError::Unparseable {
        output: trimmed.to_string(),
    })
}

/// Major 1 is classic, 2 and above is modern. Pre-1.0 releases were classic too.
pub fn classify_yarn(version: &Version) -> Dialect {
    match version.major {
        0 | 1 => Dialect::YarnClassic,
        _ => Dialect::YarnModern,
    }
}

/// Classify a version string such as `"1.22.19"` or `"4.1.0"`.
pub fn classify_yarn_output(output: &str) -> Result<Dialect, VersionError> {
    parse_version(output).map(|version| classify_yarn(&version))
}

/// Ask the installed yarn which dialect it speaks.
pub fn probe_yarn(reporter: &dyn VersionReporter, cwd: &Path) -> Result<Dialect, VersionError> {
    let output = reporter
        .version("yarn", cwd)
        .map_err(|source| VersionError::Unavailable {
            program: "yarn".to_string(),
            source,
        })?;
    let dialect = classify_yarn_output(&output)?;
    tracing::debug!(%output, %dialect, "classified yarn");
    Ok(dialect)
}
