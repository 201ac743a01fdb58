//! Snapshotting a corpus into a registry manifest.
//!
//! The registry is a frozen expectation; this is how it gets frozen. The
//! current disk state under a root is located and written out as a
//! [`Manifest`], either as one flat scope or as one scope per directory.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use crate::backend::TargetBackend;
use crate::errors::SnapshotError;
use crate::locate::{locate, MatchRule};
use crate::manifest::{EntryManifest, Manifest, ScopeManifest};

/// How a snapshot is shaped.
#[derive(Clone, Debug, Default)]
pub struct SnapshotOptions {
    /// One child scope per subdirectory instead of a single flat scope.
    pub nest: bool,
    /// Backend override for the root scope.
    pub backend: Option<TargetBackend>,
    /// Display name for the root scope.
    pub name: Option<String>,
}

/// Freeze the fixtures under `base/root` into a manifest.
///
/// The result is validated by building it, so a corpus whose fixtures
/// collide cannot be snapshotted.
#[tracing::instrument(
    level = "debug",
    skip_all,
    fields(base = %base.display(), root = %root.display())
)]
pub fn snapshot(
    base: &Path,
    root: &Path,
    rule: &MatchRule,
    options: &SnapshotOptions,
) -> Result<Manifest, SnapshotError> {
    let dir = base.join(root);
    let mut scope = if options.nest {
        // Nested scopes are recursive so new subdirectories show up as drift.
        let rule = rule.clone().recursive(true);
        let mut tree = DirNode::default();
        for rel in locate(&dir, &rule)? {
            tree.insert(&rel);
        }
        tree.into_scope(root.to_path_buf(), &rule)
    } else {
        let mut scope = ScopeManifest::new(root, rule);
        scope.entries = locate(&dir, rule)?
            .into_iter()
            .map(EntryManifest::Path)
            .collect();
        scope
    };
    scope.name.clone_from(&options.name);
    scope.backend = options.backend;

    let manifest = Manifest {
        base: base.to_path_buf(),
        default_backend: TargetBackend::Any,
        scope,
    };
    let tree = manifest.to_tree(None)?;
    tracing::info!(
        scopes = tree.scope_ids().count(),
        entries = tree.entry_count(),
        "snapshot taken"
    );
    Ok(manifest)
}

/// Located fixtures grouped by directory.
#[derive(Default)]
struct DirNode {
    fixtures: Vec<PathBuf>,
    subdirs: BTreeMap<String, DirNode>,
}

impl DirNode {
    fn insert(&mut self, rel: &Path) {
        let names: Vec<String> = rel
            .components()
            .filter_map(|c| match c {
                Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();
        let Some((file, dirs)) = names.split_last() else {
            return;
        };

        let mut node = self;
        for dir in dirs {
            node = node.subdirs.entry(dir.clone()).or_default();
        }
        node.fixtures.push(PathBuf::from(file));
    }

    fn into_scope(self, root: PathBuf, rule: &MatchRule) -> ScopeManifest {
        let mut scope = ScopeManifest::new(root.clone(), rule);
        scope.entries = self.fixtures.into_iter().map(EntryManifest::Path).collect();
        scope.children = self
            .subdirs
            .into_iter()
            .map(|(name, node)| node.into_scope(root.join(name), rule))
            .collect();
        scope
    }
}
