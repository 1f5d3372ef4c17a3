//! Runtime pin detection.
//!
//! A pin is a toolchain manager (corepack, volta, asdf/mise, nvm) holding the
//! project to specific tool versions. It is metadata about the project and only
//! selects a dialect when the configuration opts in.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::agent::{Dialect, ManagerName};
use crate::version::classify_yarn_output;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PinTool {
    /// `packageManager` in `package.json`
    Corepack,
    /// `volta` in `package.json`
    Volta,
    /// `.tool-versions`
    ToolVersions,
    /// `.nvmrc` or `.node-version`
    NodeVersionFile,
}

impl fmt::Display for PinTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PinTool::Corepack => "corepack",
            PinTool::Volta => "volta",
            PinTool::ToolVersions => "tool-versions",
            PinTool::NodeVersionFile => "node-version-file",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuntimePin {
    pub tool: PinTool,
    /// Manager named by the pin, if it names one.
    pub manager: Option<String>,
    pub version: Option<String>,
}

impl RuntimePin {
    /// The dialect this pin names, when it is precise enough to name one.
    ///
    /// A yarn pin needs a version to pick between classic and modern.
    pub fn dialect(&self) -> Option<Dialect> {
        let manager: ManagerName = self.manager.as_deref()?.parse().ok()?;
        match manager {
            ManagerName::Exact(dialect) => Some(dialect),
            ManagerName::Yarn => classify_yarn_output(self.version.as_deref()?).ok(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PackageJsonPins {
    package_manager: Option<String>,
    volta: Option<VoltaPins>,
}

#[derive(Debug, Default, Deserialize)]
struct VoltaPins {
    node: Option<String>,
    npm: Option<String>,
    yarn: Option<String>,
    pnpm: Option<String>,
}

const TOOL_VERSION_MANAGERS: [&str; 5] = ["pnpm", "yarn", "bun", "deno", "npm"];

/// Detect the first pin present in `project_dir`.
pub fn detect(project_dir: &Path) -> Option<RuntimePin> {
    let pins = read_package_json_pins(project_dir);
    corepack_pin(&pins)
        .or_else(|| volta_pin(&pins))
        .or_else(|| tool_versions_pin(project_dir))
        .or_else(|| node_version_file_pin(project_dir))
}

fn read_optional(path: &Path) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(text) => Some(text),
        Err(e) if e.kind() == ErrorKind::NotFound => None,
        Err(e) => {
            tracing::warn!(path = %path.display(), %e, "could not read pin source");
            None
        }
    }
}

fn read_package_json_pins(project_dir: &Path) -> PackageJsonPins {
    let path = project_dir.join("package.json");
    let Some(text) = read_optional(&path) else {
        return PackageJsonPins::default();
    };
    let de = &mut serde_json::Deserializer::from_str(&text);
    match serde_path_to_error::deserialize(de) {
        Ok(pins) => pins,
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                at = %e.path(),
                "ignoring pins in invalid package.json: {}",
                e.inner()
            );
            PackageJsonPins::default()
        }
    }
}

/// Split `"pnpm@9.1.0+sha512.abc"` into name and version.
fn split_manager_spec(spec: &str) -> (String, Option<String>) {
    let spec = spec.trim();
    match spec.split_once('@') {
        Some((name, version)) => {
            let version = version.split('+').next().unwrap_or(version).trim();
            let version = (!version.is_empty()).then(|| version.to_string());
            (name.trim().to_string(), version)
        }
        None => (spec.to_string(), None),
    }
}

fn corepack_pin(pins: &PackageJsonPins) -> Option<RuntimePin> {
    let (manager, version) = split_manager_spec(pins.package_manager.as_deref()?);
    Some(RuntimePin {
        tool: PinTool::Corepack,
        manager: Some(manager),
        version,
    })
}

fn volta_pin(pins: &PackageJsonPins) -> Option<RuntimePin> {
    let volta = pins.volta.as_ref()?;
    let (manager, version) = [("yarn", &volta.yarn), ("pnpm", &volta.pnpm), ("npm", &volta.npm)]
        .into_iter()
        .find_map(|(name, version)| Some((name, version.as_ref()?)))
        .map(|(name, version)| (Some(name.to_string()), Some(version.clone())))
        .unwrap_or((None, None));

    if manager.is_none() && volta.node.is_none() {
        return None;
    }
    Some(RuntimePin {
        tool: PinTool::Volta,
        manager,
        version,
    })
}

fn tool_versions_pin(project_dir: &Path) -> Option<RuntimePin> {
    let text = read_optional(&project_dir.join(".tool-versions"))?;
    let mut pinned_node = false;
    for line in text.lines() {
        let line = line.split('#').next().unwrap_or_default();
        let mut fields = line.split_whitespace();
        let (Some(tool), version) = (fields.next(), fields.next()) else {
            continue;
        };
        if TOOL_VERSION_MANAGERS.contains(&tool) {
            return Some(RuntimePin {
                tool: PinTool::ToolVersions,
                manager: Some(tool.to_string()),
                version: version.map(str::to_string),
            });
        }
        pinned_node |= tool == "nodejs" || tool == "node";
    }
    pinned_node.then_some(RuntimePin {
        tool: PinTool::ToolVersions,
        manager: None,
        version: None,
    })
}

fn node_version_file_pin(project_dir: &Path) -> Option<RuntimePin> {
    [".nvmrc", ".node-version"]
        .into_iter()
        .any(|name| project_dir.join(name).is_file())
        .then_some(RuntimePin {
            tool: PinTool::NodeVersionFile,
            manager: None,
            version: None,
        })
}
