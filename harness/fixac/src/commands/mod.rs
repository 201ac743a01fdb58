//! Command handlers for the `fixa` CLI.
//!
//! Each submodule implements one command. Flag parsing shared between
//! commands, and registry loading, live here in the module root.

use std::path::Path;

use fixa_corpus::{
    LocateMode, Manifest, MatchRule, RegistryDefect, ScopeTree, TargetBackend, UnknownBackend,
};

mod check;
mod locate;
mod run;
mod snapshot;

pub use check::check_manifest;
pub use locate::locate_fixtures;
pub use run::{print_suite_summary, run_manifest};
pub use snapshot::snapshot_corpus;

/// Flags describing a scope rule on the command line.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RuleArgs {
    pub pattern: Option<String>,
    pub dirs: bool,
    pub recursive: bool,
    pub exclude: Option<String>,
}

impl RuleArgs {
    /// Consume `arg` if it is a rule flag.
    pub fn accept(&mut self, arg: &str) -> bool {
        if let Some(pattern) = arg.strip_prefix("--pattern=") {
            self.pattern = Some(pattern.to_string());
        } else if let Some(exclude) = arg.strip_prefix("--exclude=") {
            self.exclude = Some(exclude.to_string());
        } else if arg == "--dirs" {
            self.dirs = true;
        } else if arg == "--recursive" || arg == "-r" {
            self.recursive = true;
        } else {
            return false;
        }
        true
    }

    /// Build the rule; `None` when no pattern was given.
    pub fn to_rule(&self) -> Option<Result<MatchRule, RegistryDefect>> {
        let pattern = self.pattern.as_deref()?;
        let mode = if self.dirs {
            LocateMode::Directories
        } else {
            LocateMode::Files
        };
        let rule = MatchRule::new(pattern, mode).map(|rule| rule.recursive(self.recursive));
        Some(match &self.exclude {
            Some(exclude) => rule.and_then(|rule| rule.with_exclude(exclude)),
            None => rule,
        })
    }

    /// The rule, or exit with a usage error.
    pub fn rule_or_exit(&self) -> MatchRule {
        match self.to_rule() {
            Some(Ok(rule)) => rule,
            Some(Err(e)) => {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
            None => {
                eprintln!("error: missing --pattern=<regex>");
                std::process::exit(1);
            }
        }
    }
}

/// Parse a `--backend=<name>` flag value.
pub fn parse_backend_flag(arg: &str) -> Option<Result<TargetBackend, UnknownBackend>> {
    arg.strip_prefix("--backend=").map(str::parse)
}

/// Load a manifest and build its tree, or exit with the reason.
pub(crate) fn load_tree(path: &str, backend: Option<TargetBackend>) -> ScopeTree {
    let path = Path::new(path);
    if !path.exists() {
        eprintln!("Manifest not found: {}", path.display());
        std::process::exit(1);
    }
    match Manifest::load(path, backend) {
        Ok(tree) => tree,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}
