//! Fixture location.
//!
//! Walks a scope root and returns every entry whose basename matches the
//! scope's rule, as paths relative to the root in lexicographic
//! (component-wise) order.
//!
//! Hidden entries (leading `.`) are never fixtures and are never descended
//! into. The same goes for basenames matching the rule's exclude pattern.

use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::{LocatorError, RegistryDefect};

/// What kind of filesystem entry a fixture is.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocateMode {
    /// Fixtures are single files; the pattern matches file names.
    #[default]
    Files,
    /// Fixtures are directories; the pattern matches directory names.
    Directories,
}

/// Name-matching rule for one scope.
#[derive(Clone, Debug)]
pub struct MatchRule {
    /// Pattern as written, kept for manifests and messages.
    source: String,
    /// `source` wrapped in `^(?:...)$` so matching is always whole-name.
    pattern: Regex,
    mode: LocateMode,
    recursive: bool,
    exclude: Option<(String, Regex)>,
}

impl MatchRule {
    /// Create a non-recursive rule.
    ///
    /// The pattern must match the whole basename. Capture group 1, when the
    /// pattern has one, is the fixture stem used for normalization.
    pub fn new(pattern: &str, mode: LocateMode) -> Result<Self, RegistryDefect> {
        Ok(MatchRule {
            source: pattern.to_string(),
            pattern: compile_anchored(pattern)?,
            mode,
            recursive: false,
            exclude: None,
        })
    }

    /// Rule for single-file fixtures.
    pub fn files(pattern: &str) -> Result<Self, RegistryDefect> {
        Self::new(pattern, LocateMode::Files)
    }

    /// Rule for directory fixtures.
    pub fn directories(pattern: &str) -> Result<Self, RegistryDefect> {
        Self::new(pattern, LocateMode::Directories)
    }

    /// Descend into subdirectories that are not themselves fixtures.
    #[must_use]
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Skip (and never descend into) entries whose basename matches `pattern`.
    pub fn with_exclude(mut self, pattern: &str) -> Result<Self, RegistryDefect> {
        self.exclude = Some((pattern.to_string(), compile_anchored(pattern)?));
        Ok(self)
    }

    pub fn pattern(&self) -> &str {
        &self.source
    }

    pub fn mode(&self) -> LocateMode {
        self.mode
    }

    pub fn is_recursive(&self) -> bool {
        self.recursive
    }

    pub fn exclude(&self) -> Option<&str> {
        self.exclude.as_ref().map(|(source, _)| source.as_str())
    }

    /// Whether `name` is a fixture basename under this rule.
    pub fn matches(&self, name: &str) -> bool {
        !self.skips(name) && self.pattern.is_match(name)
    }

    /// Whether `name` is invisible to the locator (hidden or excluded).
    pub fn skips(&self, name: &str) -> bool {
        name.starts_with('.')
            || self
                .exclude
                .as_ref()
                .is_some_and(|(_, exclude)| exclude.is_match(name))
    }

    /// The part of a fixture basename that names the fixture.
    ///
    /// Capture group 1 when present and matched, else the whole name.
    pub fn stem<'n>(&self, name: &'n str) -> &'n str {
        self.pattern
            .captures(name)
            .and_then(|caps| caps.get(1))
            .map_or(name, |m| m.as_str())
    }
}

fn compile_anchored(pattern: &str) -> Result<Regex, RegistryDefect> {
    Regex::new(&format!("^(?:{pattern})$")).map_err(|e| RegistryDefect::InvalidPattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })
}

/// Locate every fixture under `root`.
///
/// An empty result is not an error; drift is the checker's business.
pub fn locate(root: &Path, rule: &MatchRule) -> Result<Vec<PathBuf>, LocatorError> {
    match fs::metadata(root) {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => {
            return Err(LocatorError::NotADirectory {
                root: root.to_path_buf(),
            })
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(LocatorError::Missing {
                root: root.to_path_buf(),
            })
        }
        Err(e) => return Err(LocatorError::unreadable(root.to_path_buf(), &e)),
    }

    let mut found = Vec::new();
    walk(root, Path::new(""), rule, &mut found)?;
    found.sort();
    tracing::debug!(
        root = %root.display(),
        pattern = rule.pattern(),
        count = found.len(),
        "located fixtures"
    );
    Ok(found)
}

fn walk(
    dir: &Path,
    rel: &Path,
    rule: &MatchRule,
    found: &mut Vec<PathBuf>,
) -> Result<(), LocatorError> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| LocatorError::unreadable(dir.to_path_buf(), &e))? {
        let entry = entry.map_err(|e| LocatorError::unreadable(dir.to_path_buf(), &e))?;
        paths.push(entry.path());
    }
    paths.sort();

    for path in paths {
        let Some(name) = path.file_name().and_then(OsStr::to_str) else {
            return Err(LocatorError::NonUtf8Name { path });
        };
        if rule.skips(name) {
            continue;
        }

        let rel_path = rel.join(name);
        match (rule.mode, path.is_dir()) {
            (LocateMode::Files, false) | (LocateMode::Directories, true)
                if rule.pattern.is_match(name) =>
            {
                found.push(rel_path);
            }
            (_, true) if rule.recursive => walk(&path, &rel_path, rule, found)?,
            _ => {}
        }
    }

    Ok(())
}
