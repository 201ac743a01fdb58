//! Registry manifests.
//!
//! A manifest is the checked-in form of a [`ScopeTree`]. It is plain JSON so
//! it can be reviewed in diffs and compiled into a test binary with
//! `include_str!`:
//!
//! ```text
//! {
//!   "base": "testData",
//!   "default_backend": "ANY",
//!   "scope": {
//!     "root": "callableReference",
//!     "pattern": "(.+)\\.kt",
//!     "recursive": true,
//!     "entries": ["topLevel.kt", { "path": "classLevel.kt", "label": "class" }],
//!     "children": [
//!       { "root": "callableReference/bound", "pattern": "(.+)\\.kt",
//!         "backend": "JS_IR", "entries": ["simple.kt"] }
//!     ]
//!   }
//! }
//! ```
//!
//! Manifests are configuration: the harness only reads them. New ones come
//! from [`snapshot`](crate::snapshot::snapshot).

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::backend::TargetBackend;
use crate::errors::{ManifestError, RegistryDefect};
use crate::locate::{LocateMode, MatchRule};
use crate::scope::{EntryDecl, ScopeDecl, ScopeTree};

/// A whole registry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Directory scope roots are relative to.
    #[serde(default = "current_dir")]
    pub base: PathBuf,
    #[serde(default)]
    pub default_backend: TargetBackend,
    pub scope: ScopeManifest,
}

fn current_dir() -> PathBuf {
    PathBuf::from(".")
}

/// One scope and, recursively, its children.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScopeManifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Relative to the manifest base.
    pub root: PathBuf,
    pub pattern: String,
    #[serde(default)]
    pub mode: LocateMode,
    #[serde(default)]
    pub recursive: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<TargetBackend>,
    #[serde(default)]
    pub entries: Vec<EntryManifest>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ScopeManifest>,
}

/// A declared fixture: a bare path, or a path with a display label.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntryManifest {
    Path(PathBuf),
    Labeled { path: PathBuf, label: String },
}

impl FromStr for Manifest {
    type Err = ManifestError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Ok(serde_json::from_str(text)?)
    }
}

impl Manifest {
    /// Read a manifest file.
    ///
    /// A relative `base` is taken relative to the manifest's own directory.
    pub fn from_path(path: &Path) -> Result<Self, ManifestError> {
        let text = fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut manifest: Manifest = text.parse()?;
        if manifest.base.is_relative() {
            if let Some(dir) = path.parent() {
                manifest.base = dir.join(&manifest.base);
            }
        }
        tracing::debug!(
            manifest = %path.display(),
            base = %manifest.base.display(),
            "loaded manifest"
        );
        Ok(manifest)
    }

    /// Read a manifest file and build its tree.
    pub fn load(path: &Path, backend: Option<TargetBackend>) -> Result<ScopeTree, ManifestError> {
        Ok(Self::from_path(path)?.to_tree(backend)?)
    }

    /// Build the scope tree, optionally replacing the default backend.
    pub fn to_tree(&self, backend: Option<TargetBackend>) -> Result<ScopeTree, RegistryDefect> {
        ScopeTree::build(
            &self.base,
            backend.unwrap_or(self.default_backend),
            self.scope.to_decl()?,
        )
    }

    pub fn to_json(&self) -> Result<String, ManifestError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl ScopeManifest {
    /// An empty scope at `root` described by `rule`.
    pub fn new(root: impl Into<PathBuf>, rule: &MatchRule) -> Self {
        ScopeManifest {
            name: None,
            root: root.into(),
            pattern: rule.pattern().to_string(),
            mode: rule.mode(),
            recursive: rule.is_recursive(),
            exclude: rule.exclude().map(str::to_string),
            backend: None,
            entries: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn rule(&self) -> Result<MatchRule, RegistryDefect> {
        let rule = MatchRule::new(&self.pattern, self.mode)?.recursive(self.recursive);
        match &self.exclude {
            Some(exclude) => rule.with_exclude(exclude),
            None => Ok(rule),
        }
    }

    pub fn to_decl(&self) -> Result<ScopeDecl, RegistryDefect> {
        let mut decl = ScopeDecl::new(self.root.clone(), self.rule()?)
            .entries(self.entries.iter().map(EntryManifest::to_decl));
        if let Some(name) = &self.name {
            decl = decl.named(name.clone());
        }
        if let Some(backend) = self.backend {
            decl = decl.backend(backend);
        }
        for child in &self.children {
            decl = decl.child(child.to_decl()?);
        }
        Ok(decl)
    }
}

impl EntryManifest {
    pub fn path(&self) -> &Path {
        match self {
            EntryManifest::Path(path) | EntryManifest::Labeled { path, .. } => path,
        }
    }

    fn to_decl(&self) -> EntryDecl {
        match self {
            EntryManifest::Path(path) => EntryDecl::new(path.clone()),
            EntryManifest::Labeled { path, label } => {
                EntryDecl::new(path.clone()).with_label(label.clone())
            }
        }
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
