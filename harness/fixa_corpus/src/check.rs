//! Consistency checking: registry versus disk.
//!
//! For every scope the locator runs over the scope root, paths claimed by a
//! child scope are dropped, and the remaining fixtures are diffed against
//! the scope's own entries. An entry is present only when its own path was
//! located; a different file that happens to share its id does not count.
//!
//!
//! - **unregistered**: on disk, not in the registry
//! - **stale**: in the registry, not on disk
//! - **collisions**: distinct paths on disk that normalize to one id
//!
//! The filesystem is the source of truth and nothing is cached; two checks
//! over an unchanged tree produce equal reports.

use std::fmt;
use std::path::{Path, PathBuf};

use rustc_hash::{FxHashMap, FxHashSet};

use crate::errors::LocatorError;
use crate::id::{collision_key, normalize, FixtureId};
use crate::locate::locate;
use crate::scope::{ScopeId, ScopeTree, TestEntry};

/// A registry entry with no fixture on disk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StaleEntry {
    pub id: FixtureId,
    /// Relative to the scope root.
    pub path: PathBuf,
}

/// Fixtures on disk that normalize to the same identifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdCollision {
    pub id: FixtureId,
    /// Relative to the scope root, sorted.
    pub paths: Vec<PathBuf>,
}

/// Drift findings for one reachable scope.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScopeFindings {
    /// Relative to the scope root, sorted.
    pub unregistered: Vec<PathBuf>,
    pub stale: Vec<StaleEntry>,
    pub collisions: Vec<IdCollision>,
}

impl ScopeFindings {
    pub fn is_clean(&self) -> bool {
        self.unregistered.is_empty() && self.stale.is_empty() && self.collisions.is_empty()
    }
}

/// How checking one scope went.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScopeOutcome {
    /// The scope was walked and diffed.
    Checked(ScopeFindings),
    /// The scope root could not be walked.
    Unreachable(LocatorError),
    /// An ancestor's root could not be walked, so this scope was not checked.
    Skipped { unreachable_ancestor: PathBuf },
}

/// Result of checking one scope.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScopeReport {
    pub scope: ScopeId,
    /// Qualified scope name (`Outer::Inner`).
    pub name: String,
    /// Scope root relative to the tree base.
    pub root: PathBuf,
    pub outcome: ScopeOutcome,
}

impl ScopeReport {
    pub fn is_clean(&self) -> bool {
        matches!(&self.outcome, ScopeOutcome::Checked(findings) if findings.is_clean())
    }
}

/// Per-scope findings for a whole tree, in pre-order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConsistencyReport {
    pub scopes: Vec<ScopeReport>,
}

impl ConsistencyReport {
    /// No drift, no collisions, and every scope reachable.
    pub fn is_consistent(&self) -> bool {
        self.scopes.iter().all(ScopeReport::is_clean)
    }

    /// Scopes with something to report.
    pub fn failures(&self) -> impl Iterator<Item = &ScopeReport> + '_ {
        self.scopes.iter().filter(|scope| !scope.is_clean())
    }

    /// Findings for one scope, if it was checked.
    pub fn findings(&self, scope: ScopeId) -> Option<&ScopeFindings> {
        self.scopes
            .iter()
            .find(|report| report.scope == scope)
            .and_then(|report| match &report.outcome {
                ScopeOutcome::Checked(findings) => Some(findings),
                _ => None,
            })
    }

    /// `Ok` when consistent, else the report as a [`ConsistencyFailure`].
    pub fn into_result(self) -> Result<(), ConsistencyFailure> {
        if self.is_consistent() {
            Ok(())
        } else {
            Err(ConsistencyFailure { report: self })
        }
    }
}

impl fmt::Display for ConsistencyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_consistent() {
            return write!(f, "all fixtures present in {} scope(s)", self.scopes.len());
        }

        let mut first = true;
        for scope in self.failures() {
            if !first {
                writeln!(f)?;
            }
            first = false;
            write!(f, "{} ({})", scope.name, scope.root.display())?;
            match &scope.outcome {
                ScopeOutcome::Checked(findings) => {
                    for path in &findings.unregistered {
                        write!(f, "\n  unregistered fixture: {}", path.display())?;
                    }
                    for stale in &findings.stale {
                        write!(f, "\n  stale entry: {} ({})", stale.id, stale.path.display())?;
                    }
                    for collision in &findings.collisions {
                        let paths: Vec<String> = collision
                            .paths
                            .iter()
                            .map(|p| p.display().to_string())
                            .collect();
                        write!(
                            f,
                            "\n  id collision: {} <- {}",
                            collision.id,
                            paths.join(", ")
                        )?;
                    }
                }
                ScopeOutcome::Unreachable(err) => write!(f, "\n  unreachable: {err}")?,
                ScopeOutcome::Skipped {
                    unreachable_ancestor,
                } => write!(
                    f,
                    "\n  not checked: ancestor root '{}' is unreachable",
                    unreachable_ancestor.display()
                )?,
            }
        }
        Ok(())
    }
}

/// A failed "all fixtures present" probe.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("registry and fixtures on disk disagree\n{report}")]
pub struct ConsistencyFailure {
    pub report: ConsistencyReport,
}

/// Check every scope of `tree` against the filesystem.
#[tracing::instrument(level = "debug", skip_all, fields(base = %tree.base().display()))]
pub fn check(tree: &ScopeTree) -> ConsistencyReport {
    let mut report = ConsistencyReport::default();
    check_subtree(tree, ScopeId::ROOT, None, &mut report);

    let drifted = report.failures().count();
    if drifted == 0 {
        tracing::info!(scopes = report.scopes.len(), "registry consistent with disk");
    } else {
        tracing::warn!(
            scopes = report.scopes.len(),
            drifted,
            "registry drifted from disk"
        );
    }
    report
}

fn check_subtree(
    tree: &ScopeTree,
    id: ScopeId,
    unreachable_ancestor: Option<&Path>,
    report: &mut ConsistencyReport,
) {
    let scope = tree.scope(id);
    let outcome = match unreachable_ancestor {
        Some(ancestor) => ScopeOutcome::Skipped {
            unreachable_ancestor: ancestor.to_path_buf(),
        },
        None => match check_scope(tree, id) {
            Ok(findings) => ScopeOutcome::Checked(findings),
            Err(err) => ScopeOutcome::Unreachable(err),
        },
    };
    let blocked = match (&outcome, unreachable_ancestor) {
        (_, Some(ancestor)) => Some(ancestor.to_path_buf()),
        (ScopeOutcome::Unreachable(_), None) => Some(scope.root().to_path_buf()),
        _ => None,
    };

    report.scopes.push(ScopeReport {
        scope: id,
        name: tree.qualified_name(id),
        root: scope.root().to_path_buf(),
        outcome,
    });

    for &child in scope.children() {
        check_subtree(tree, child, blocked.as_deref(), report);
    }
}

/// Diff one scope's own entries against its located fixtures.
#[tracing::instrument(level = "debug", skip(tree), fields(scope = tree.scope(id).name()))]
pub fn check_scope(tree: &ScopeTree, id: ScopeId) -> Result<ScopeFindings, LocatorError> {
    let scope = tree.scope(id);
    let located = locate(&tree.scope_dir(id), scope.rule())?;

    let claimed: Vec<&Path> = tree
        .children(id)
        .filter_map(|(_, child)| child.root().strip_prefix(scope.root()).ok())
        .collect();

    // Group located paths by collision key, keeping disk order. Paths
    // sharing an exact id land in one group even when their keys differ.
    let mut groups: FxHashMap<String, Vec<PathBuf>> = FxHashMap::default();
    let mut group_of_id: FxHashMap<FixtureId, String> = FxHashMap::default();
    let mut order = Vec::new();
    for rel in located {
        if claimed.iter().any(|claim| rel.starts_with(claim)) {
            continue;
        }
        let key = group_of_id
            .entry(normalize(&rel, scope.rule()))
            .or_insert_with(|| collision_key(&rel, scope.rule()))
            .clone();
        let group = groups.entry(key.clone()).or_default();
        if group.is_empty() {
            order.push(key);
        }
        group.push(rel);
    }

    let declared: FxHashSet<&Path> = scope
        .entries()
        .iter()
        .map(TestEntry::relative_path)
        .collect();

    let mut findings = ScopeFindings::default();
    let mut present: FxHashSet<&Path> = FxHashSet::default();

    for key in &order {
        let group = &groups[key];
        present.extend(
            group
                .iter()
                .filter_map(|rel| declared.get(rel.as_path()).copied()),
        );
        if let [rel] = group.as_slice() {
            if !declared.contains(rel.as_path()) {
                findings.unregistered.push(rel.clone());
            }
            continue;
        }

        // Colliding paths are reported as a collision only.
        let mut paths = group.clone();
        paths.sort();
        findings.collisions.push(IdCollision {
            id: normalize(&group[0], scope.rule()),
            paths,
        });
    }

    for entry in scope.entries() {
        if !present.contains(entry.relative_path()) {
            findings.stale.push(StaleEntry {
                id: entry.id().clone(),
                path: entry.relative_path().to_path_buf(),
            });
        }
    }

    findings.unregistered.sort();
    if !findings.is_clean() {
        tracing::debug!(
            unregistered = findings.unregistered.len(),
            stale = findings.stale.len(),
            collisions = findings.collisions.len(),
            "scope drift"
        );
    }
    Ok(findings)
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
