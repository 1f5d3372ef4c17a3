//! Last-resort resolution: ask the user for the install command to run.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::InteractiveError;
use crate::system::{CommandLine, TextInput};

/// Human-readable form of [`GRAMMAR`], quoted back on a mismatch.
pub const EXPECTED: &str = "<npm|yarn|pnpm|bun|deno> <install|i|add|ci> [flags] [package...]";

static GRAMMAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<manager>npm|yarn|pnpm|bun|deno)\s+(?P<verb>install|i|add|ci)(\s+(--?[A-Za-z][A-Za-z0-9-]*(=\S+)?|[@A-Za-z0-9][\w@./:^~<>=+-]*))*\s*$",
    )
    .unwrap()
});

const PROMPT: &str = "No package manager detected. Install command: ";

/// Check `input` against the install-command grammar and split it into a command line.
pub fn parse_install_command(input: &str) -> Result<CommandLine, InteractiveError> {
    let input = input.trim();
    if !GRAMMAR.is_match(input) {
        return Err(InteractiveError::Invalid {
            input: input.to_string(),
            expected: EXPECTED,
        });
    }

    let mut words = input.split_whitespace().map(str::to_string);
    let program = words.next().unwrap_or_default();
    Ok(CommandLine::new(program, words.collect()))
}

/// Prompt once and validate the answer. There is no retry; a bad answer is terminal.
#[tracing::instrument(skip(input))]
pub fn resolve(input: &dyn TextInput) -> Result<CommandLine, InteractiveError> {
    let line = input
        .read_line(PROMPT)
        .map_err(InteractiveError::Input)?
        .ok_or(InteractiveError::Cancelled)?;
    if line.trim().is_empty() {
        return Err(InteractiveError::Cancelled);
    }
    parse_install_command(&line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::testing::ScriptedInput;

    #[test]
    fn test_accepts_install_commands() {
        for input in [
            "npm install",
            "npm i react",
            "yarn add -D typescript @types/node",
            "pnpm add --save-exact react@^18.2.0",
            "bun install --frozen-lockfile",
            "npm ci",
            "deno add npm:chalk",
            "  yarn install --registry=https://registry.example.com  ",
        ] {
            assert!(parse_install_command(input).is_ok(), "{input:?} rejected");
        }
    }

    #[test]
    fn test_rejects_other_commands() {
        for input in [
            "",
            "npm",
            "cargo install ripgrep",
            "npm run build",
            "npm install; rm -rf /",
            "yarn add react && echo done",
            "install react",
        ] {
            assert!(
                matches!(
                    parse_install_command(input),
                    Err(InteractiveError::Invalid { .. })
                ),
                "{input:?} accepted"
            );
        }
    }

    #[test]
    fn test_splits_into_command_line() {
        let cmd = parse_install_command("yarn add -D  typescript").unwrap();
        assert_eq!(cmd.program, "yarn");
        assert_eq!(cmd.args, vec!["add", "-D", "typescript"]);
    }

    #[test]
    fn test_invalid_error_describes_grammar() {
        let err = parse_install_command("make install").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("make install"));
        assert!(msg.contains(EXPECTED));
    }

    #[test]
    fn test_resolve_prompts_once() {
        let input = ScriptedInput::replying("pnpm install");
        let cmd = resolve(&input).unwrap();
        assert_eq!(cmd.to_string(), "pnpm install");
        assert_eq!(input.prompts.get(), 1);
    }

    #[test]
    fn test_resolve_cancelled() {
        let input = ScriptedInput::default();
        assert!(matches!(resolve(&input), Err(InteractiveError::Cancelled)));

        let input = ScriptedInput::replying("   ");
        assert!(matches!(resolve(&input), Err(InteractiveError::Cancelled)));
    }
}
