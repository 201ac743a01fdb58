//! Scope tree construction and registry validation.

use std::path::{Component, Path, PathBuf};

use rustc_hash::{FxHashMap, FxHashSet};

use super::{EntryDecl, Scope, ScopeDecl, ScopeId, ScopeTree, TestEntry};
use crate::backend::TargetBackend;
use crate::errors::RegistryDefect;
use crate::id::{collision_key, normalize, scope_name, FixtureId};
use crate::locate::{LocateMode, MatchRule};

impl ScopeTree {
    /// Build and validate a tree from its root declaration.
    ///
    /// Scope roots are relative to `base`; entry paths are relative to their
    /// scope's root. The first defect found, scanning scopes in pre-order and
    /// entries in declaration order, is returned.
    #[tracing::instrument(level = "debug", skip_all, fields(base = %base.as_ref().display()))]
    pub fn build(
        base: impl AsRef<Path>,
        default_backend: TargetBackend,
        root: ScopeDecl,
    ) -> Result<ScopeTree, RegistryDefect> {
        let mut tree = ScopeTree {
            base: base.as_ref().to_path_buf(),
            default_backend,
            scopes: Vec::new(),
        };
        tree.add_scope(root, None, &FxHashSet::default())?;
        tracing::debug!(
            scopes = tree.scopes.len(),
            entries = tree.entry_count(),
            "registry built"
        );
        Ok(tree)
    }

    fn add_scope(
        &mut self,
        decl: ScopeDecl,
        parent: Option<ScopeId>,
        inherited_labels: &FxHashSet<String>,
    ) -> Result<ScopeId, RegistryDefect> {
        let ScopeDecl {
            name,
            root,
            rule,
            backend,
            entries,
            children,
        } = decl;
        let root = without_cur_dir(&root);
        let name = name.unwrap_or_else(|| scope_name(&root));
        let qualified = match parent {
            Some(parent) => format!("{}::{name}", self.qualified_name(parent)),
            None => name.clone(),
        };

        if let Some(parent) = parent {
            let parent_root = &self.scope(parent).root;
            if root == *parent_root || !root.starts_with(parent_root) {
                return Err(RegistryDefect::ChildOutsideParent {
                    child: qualified,
                    child_root: root,
                    parent_root: parent_root.clone(),
                });
            }
        }

        let claims = child_claims(&root, &children)?;

        let resolved_backend = backend
            .or_else(|| parent.map(|p| self.resolve_backend(p)))
            .unwrap_or(self.default_backend);
        let id = ScopeId(u32::try_from(self.scopes.len()).unwrap_or(u32::MAX));

        let mut labels = inherited_labels.clone();
        let mut seen: FxHashMap<String, PathBuf> = FxHashMap::default();
        let mut seen_ids: FxHashMap<FixtureId, PathBuf> = FxHashMap::default();
        let mut built = Vec::with_capacity(entries.len());

        for EntryDecl { path: rel, label } in entries {
            validate_entry_path(&qualified, &rel, &rule)?;
            let rel = without_cur_dir(&rel);

            if let Some((child, _)) = claims.iter().find(|(_, claim)| rel.starts_with(claim)) {
                return Err(RegistryDefect::EntryClaimedByChild {
                    scope: qualified,
                    child: child.clone(),
                    path: rel,
                });
            }

            let fixture_id = normalize(&rel, &rule);
            let first = seen
                .insert(collision_key(&rel, &rule), rel.clone())
                .or_else(|| seen_ids.insert(fixture_id.clone(), rel.clone()));
            if let Some(first) = first {
                return Err(RegistryDefect::DuplicateId {
                    scope: qualified,
                    id: fixture_id,
                    first,
                    second: rel,
                });
            }

            if let Some(label) = &label {
                if !labels.insert(label.clone()) {
                    return Err(RegistryDefect::DuplicateLabel {
                        scope: qualified,
                        label: label.clone(),
                    });
                }
            }

            built.push(TestEntry {
                id: fixture_id,
                path: root.join(&rel),
                rel,
                label,
                backend: resolved_backend,
                scope: id,
            });
        }
        built.sort_by(|a, b| a.rel.cmp(&b.rel));

        self.scopes.push(Scope {
            name,
            root,
            rule,
            backend,
            parent,
            children: Vec::with_capacity(children.len()),
            entries: built,
        });

        for child in children {
            let child_id = self.add_scope(child, Some(id), &labels)?;
            self.scopes[id.index()].children.push(child_id);
        }

        Ok(id)
    }
}

/// Roots claimed by each child, relative to the parent root.
///
/// Sibling roots must not contain one another.
fn child_claims(
    parent_root: &Path,
    children: &[ScopeDecl],
) -> Result<Vec<(String, PathBuf)>, RegistryDefect> {
    let claims: Vec<(String, PathBuf)> = children
        .iter()
        .map(|child| {
            let name = child
                .name
                .clone()
                .unwrap_or_else(|| scope_name(&child.root));
            let child_root = without_cur_dir(&child.root);
            let rel = child_root
                .strip_prefix(parent_root)
                .map_or_else(|_| child_root.clone(), Path::to_path_buf);
            (name, rel)
        })
        .collect();

    for (i, (first, a)) in claims.iter().enumerate() {
        for (second, b) in &claims[i + 1..] {
            if a.starts_with(b) || b.starts_with(a) {
                let root = if a.starts_with(b) { b } else { a };
                return Err(RegistryDefect::OverlappingScopes {
                    first: first.clone(),
                    second: second.clone(),
                    root: parent_root.join(root),
                });
            }
        }
    }

    Ok(claims)
}

/// `path` with its `.` components dropped; `.` alone becomes the empty path.
fn without_cur_dir(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

/// An entry must be something the locator could return for this rule.
fn validate_entry_path(scope: &str, rel: &Path, rule: &MatchRule) -> Result<(), RegistryDefect> {
    let invalid = || RegistryDefect::InvalidEntryPath {
        scope: scope.to_string(),
        path: rel.to_path_buf(),
    };
    let rejected = |reason| RegistryDefect::EntryRejectedByRule {
        scope: scope.to_string(),
        path: rel.to_path_buf(),
        reason,
    };

    let mut names = Vec::new();
    for component in rel.components() {
        match component {
            Component::Normal(name) => names.push(name.to_str().ok_or_else(invalid)?),
            Component::CurDir => {}
            _ => return Err(invalid()),
        }
    }
    let Some((last, dirs)) = names.split_last() else {
        return Err(invalid());
    };

    if !rule.matches(last) {
        return Err(rejected("name does not match the scope pattern"));
    }
    if !dirs.is_empty() && !rule.is_recursive() {
        return Err(rejected("nested path in a non-recursive scope"));
    }
    if dirs.iter().any(|dir| rule.skips(dir)) {
        return Err(rejected("inside a hidden or excluded directory"));
    }
    if rule.mode() == LocateMode::Directories && dirs.iter().any(|dir| rule.matches(dir)) {
        return Err(rejected("inside another directory fixture"));
    }

    Ok(())
}
