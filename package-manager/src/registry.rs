//! Command templates: how each dialect spells each intent.
//!
//! Supporting a new manager means adding its rows to [`TABLE`]; nothing else
//! in the crate changes.

use compact_str::CompactString;
use std::collections::HashMap;
use std::sync::LazyLock;

use crate::agent::{Dialect, Intent};
use crate::error::RenderError;
use crate::system::CommandLine;

/// Values substituted into a template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    pub packages: Vec<CompactString>,
    pub script: Option<CompactString>,
    /// Passed through untouched after everything else.
    pub args: Vec<String>,
}

impl Params {
    pub fn with_packages<I, S>(packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<CompactString>,
    {
        Self {
            packages: packages.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Lit(&'static str),
    /// Literal emitted only when at least one package was given.
    IfPackages(&'static str),
    /// Literal emitted only when no package was given.
    IfNoPackages(&'static str),
    /// Every package. `scheme` is prepended to names that carry none, e.g. `npm:`.
    Packages {
        required: bool,
        scheme: Option<&'static str>,
    },
    Script,
    /// `--`, only when passthrough arguments follow.
    ArgsSeparator,
    Args,
}

const PACKAGES: Slot = Slot::Packages {
    required: false,
    scheme: None,
};
const REQUIRED_PACKAGES: Slot = Slot::Packages {
    required: true,
    scheme: None,
};
const NPM_PACKAGES: Slot = Slot::Packages {
    required: false,
    scheme: Some("npm:"),
};
const REQUIRED_NPM_PACKAGES: Slot = Slot::Packages {
    required: true,
    scheme: Some("npm:"),
};

use Slot::{Args, ArgsSeparator, IfNoPackages, IfPackages, Lit, Script};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandTemplate {
    /// Program to run instead of the dialect's executable, e.g. `npx`.
    pub program: Option<&'static str>,
    pub slots: &'static [Slot],
}

const fn tpl(slots: &'static [Slot]) -> CommandTemplate {
    CommandTemplate {
        program: None,
        slots,
    }
}

const fn via(program: &'static str, slots: &'static [Slot]) -> CommandTemplate {
    CommandTemplate {
        program: Some(program),
        slots,
    }
}

const INSTALL_OR_ADD: &[Slot] = &[IfNoPackages("install"), IfPackages("add"), PACKAGES, Args];
const PLAIN_RUN: &[Slot] = &[Lit("run"), Script, Args];
const REMOVE: &[Slot] = &[Lit("remove"), REQUIRED_PACKAGES, Args];

/// Every (dialect, intent) pair except [`Intent::Agent`] has exactly one row.
pub const TABLE: &[(Dialect, Intent, CommandTemplate)] = &[
    // npm
    (Dialect::Npm, Intent::Install, tpl(&[Lit("install"), PACKAGES, Args])),
    (Dialect::Npm, Intent::Run, tpl(&[Lit("run"), Script, ArgsSeparator, Args])),
    (
        Dialect::Npm,
        Intent::Exec,
        tpl(&[Lit("exec"), Lit("--no"), Lit("--"), REQUIRED_PACKAGES, Args]),
    ),
    (Dialect::Npm, Intent::Dlx, via("npx", &[Lit("--yes"), REQUIRED_PACKAGES, Args])),
    (Dialect::Npm, Intent::Update, tpl(&[Lit("update"), PACKAGES, Args])),
    (Dialect::Npm, Intent::Uninstall, tpl(&[Lit("uninstall"), REQUIRED_PACKAGES, Args])),
    (Dialect::Npm, Intent::CleanInstall, tpl(&[Lit("ci"), Args])),
    // yarn 1.x
    (Dialect::YarnClassic, Intent::Install, tpl(INSTALL_OR_ADD)),
    (Dialect::YarnClassic, Intent::Run, tpl(PLAIN_RUN)),
    (Dialect::YarnClassic, Intent::Exec, tpl(&[Lit("exec"), REQUIRED_PACKAGES, Args])),
    (
        Dialect::YarnClassic,
        Intent::Dlx,
        via("npx", &[Lit("--yes"), REQUIRED_PACKAGES, Args]),
    ),
    (Dialect::YarnClassic, Intent::Update, tpl(&[Lit("upgrade"), PACKAGES, Args])),
    (Dialect::YarnClassic, Intent::Uninstall, tpl(REMOVE)),
    (
        Dialect::YarnClassic,
        Intent::CleanInstall,
        tpl(&[Lit("install"), Lit("--frozen-lockfile"), Args]),
    ),
    // yarn 2+
    (Dialect::YarnModern, Intent::Install, tpl(INSTALL_OR_ADD)),
    (Dialect::YarnModern, Intent::Run, tpl(PLAIN_RUN)),
    (Dialect::YarnModern, Intent::Exec, tpl(&[Lit("exec"), REQUIRED_PACKAGES, Args])),
    (Dialect::YarnModern, Intent::Dlx, tpl(&[Lit("dlx"), REQUIRED_PACKAGES, Args])),
    (Dialect::YarnModern, Intent::Update, tpl(&[Lit("up"), REQUIRED_PACKAGES, Args])),
    (Dialect::YarnModern, Intent::Uninstall, tpl(REMOVE)),
    (
        Dialect::YarnModern,
        Intent::CleanInstall,
        tpl(&[Lit("install"), Lit("--immutable"), Args]),
    ),
    // pnpm
    (Dialect::Pnpm, Intent::Install, tpl(INSTALL_OR_ADD)),
    (Dialect::Pnpm, Intent::Run, tpl(PLAIN_RUN)),
    (Dialect::Pnpm, Intent::Exec, tpl(&[Lit("exec"), REQUIRED_PACKAGES, Args])),
    (Dialect::Pnpm, Intent::Dlx, tpl(&[Lit("dlx"), REQUIRED_PACKAGES, Args])),
    (Dialect::Pnpm, Intent::Update, tpl(&[Lit("update"), PACKAGES, Args])),
    (Dialect::Pnpm, Intent::Uninstall, tpl(REMOVE)),
    (
        Dialect::Pnpm,
        Intent::CleanInstall,
        tpl(&[Lit("install"), Lit("--frozen-lockfile"), Args]),
    ),
    // bun
    (Dialect::Bun, Intent::Install, tpl(INSTALL_OR_ADD)),
    (Dialect::Bun, Intent::Run, tpl(PLAIN_RUN)),
    (Dialect::Bun, Intent::Exec, tpl(&[Lit("x"), REQUIRED_PACKAGES, Args])),
    (Dialect::Bun, Intent::Dlx, tpl(&[Lit("x"), REQUIRED_PACKAGES, Args])),
    (Dialect::Bun, Intent::Update, tpl(&[Lit("update"), PACKAGES, Args])),
    (Dialect::Bun, Intent::Uninstall, tpl(REMOVE)),
    (
        Dialect::Bun,
        Intent::CleanInstall,
        tpl(&[Lit("install"), Lit("--frozen-lockfile"), Args]),
    ),
    // deno
    (
        Dialect::Deno,
        Intent::Install,
        tpl(&[IfNoPackages("install"), IfPackages("add"), NPM_PACKAGES, Args]),
    ),
    (Dialect::Deno, Intent::Run, tpl(&[Lit("task"), Script, Args])),
    (
        Dialect::Deno,
        Intent::Exec,
        tpl(&[Lit("run"), Lit("-A"), REQUIRED_NPM_PACKAGES, Args]),
    ),
    (
        Dialect::Deno,
        Intent::Dlx,
        tpl(&[Lit("run"), Lit("-A"), REQUIRED_NPM_PACKAGES, Args]),
    ),
    (
        Dialect::Deno,
        Intent::Update,
        tpl(&[Lit("outdated"), Lit("--update"), PACKAGES, Args]),
    ),
    (Dialect::Deno, Intent::Uninstall, tpl(REMOVE)),
    (
        Dialect::Deno,
        Intent::CleanInstall,
        tpl(&[Lit("install"), Lit("--frozen"), Args]),
    ),
];

/// Lookup table built once from [`TABLE`] and never mutated.
#[derive(Debug, Clone)]
pub struct Registry {
    templates: HashMap<(Dialect, Intent), CommandTemplate>,
}

static BUILTIN: LazyLock<Registry> = LazyLock::new(|| Registry::from_table(TABLE));

impl Registry {
    pub fn builtin() -> &'static Registry {
        &BUILTIN
    }

    /// Later rows for the same pair replace earlier ones.
    pub fn from_table(table: &[(Dialect, Intent, CommandTemplate)]) -> Self {
        let templates = table
            .iter()
            .map(|(dialect, intent, template)| ((*dialect, *intent), *template))
            .collect();
        Self { templates }
    }

    pub fn template(
        &self,
        dialect: Dialect,
        intent: Intent,
    ) -> Result<&CommandTemplate, RenderError> {
        self.templates
            .get(&(dialect, intent))
            .ok_or(RenderError::MissingTemplate { dialect, intent })
    }

    /// Substitute `params` into the template for `(dialect, intent)`. Pure.
    pub fn render(
        &self,
        dialect: Dialect,
        intent: Intent,
        params: &Params,
    ) -> Result<CommandLine, RenderError> {
        let template = self.template(dialect, intent)?;
        let missing = |parameter| RenderError::MissingParameter {
            dialect,
            intent,
            parameter,
        };

        let mut args = Vec::new();
        for slot in template.slots {
            match *slot {
                Lit(text) => args.push(text.to_string()),
                IfPackages(text) => {
                    if !params.packages.is_empty() {
                        args.push(text.to_string());
                    }
                }
                IfNoPackages(text) => {
                    if params.packages.is_empty() {
                        args.push(text.to_string());
                    }
                }
                Slot::Packages { required, scheme } => {
                    if required && params.packages.is_empty() {
                        return Err(missing("package"));
                    }
                    args.extend(params.packages.iter().map(|name| with_scheme(name, scheme)));
                }
                Script => {
                    let script = params.script.as_ref().ok_or_else(|| missing("script"))?;
                    args.push(script.to_string());
                }
                ArgsSeparator => {
                    if !params.args.is_empty() {
                        args.push("--".to_string());
                    }
                }
                Args => args.extend(params.args.iter().cloned()),
            }
        }

        let program = template.program.unwrap_or(dialect.executable());
        Ok(CommandLine::new(program, args))
    }
}

fn with_scheme(name: &str, scheme: Option<&'static str>) -> String {
    match scheme {
        Some(scheme) if !name.contains(':') => format!("{scheme}{name}"),
        _ => name.to_string(),
    }
}

/// Render through the builtin registry.
pub fn render(
    dialect: Dialect,
    intent: Intent,
    params: &Params,
) -> Result<CommandLine, RenderError> {
    Registry::builtin().render(dialect, intent, params)
}
