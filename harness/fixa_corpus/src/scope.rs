//! The scope tree: the declared registry of fixtures.
//!
//! A [`ScopeTree`] is the frozen expectation of a corpus. Each [`Scope`] owns
//! a root directory, a [`MatchRule`], an optional backend override, its own
//! [`TestEntry`] list and its child scopes. Scopes live in a flat arena in
//! pre-order and refer to each other by [`ScopeId`].
//!
//! Trees are built once through [`ScopeTree::build`] and are read-only
//! afterwards, so checks and dispatches can share them across threads.
//!
//! # Architecture
//!
//! ```text
//! ScopeDecl (declared) ──build──► ScopeTree ──check()──► ConsistencyReport
//!                                     │
//!                                     └──entries()──► TestEntry ──► dispatch
//! ```

mod build;
mod decl;

use std::path::{Path, PathBuf};

use crate::backend::TargetBackend;
use crate::id::FixtureId;
use crate::locate::MatchRule;

pub use decl::{EntryDecl, ScopeDecl};

/// Index of a scope within its tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(u32);

impl ScopeId {
    /// The root scope of every tree.
    pub const ROOT: ScopeId = ScopeId(0);

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A declared unit of work.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestEntry {
    id: FixtureId,
    /// Path relative to the owning scope's root.
    rel: PathBuf,
    /// Path relative to the tree base.
    path: PathBuf,
    label: Option<String>,
    backend: TargetBackend,
    scope: ScopeId,
}

impl TestEntry {
    pub fn id(&self) -> &FixtureId {
        &self.id
    }

    /// Fixture path relative to the owning scope's root.
    pub fn relative_path(&self) -> &Path {
        &self.rel
    }

    /// Fixture path relative to the tree base; this is what gets executed.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Backend resolved from the nearest scope override, or the tree default.
    pub fn backend(&self) -> TargetBackend {
        self.backend
    }

    pub fn scope(&self) -> ScopeId {
        self.scope
    }

    /// Label if present, else the fixture id.
    pub fn display_name(&self) -> &str {
        self.label.as_deref().unwrap_or(self.id.as_str())
    }
}

/// A node of the scope tree.
#[derive(Clone, Debug)]
pub struct Scope {
    name: String,
    /// Relative to the tree base.
    root: PathBuf,
    rule: MatchRule,
    backend: Option<TargetBackend>,
    parent: Option<ScopeId>,
    children: Vec<ScopeId>,
    /// Sorted by relative path.
    entries: Vec<TestEntry>,
}

impl Scope {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Root directory, relative to the tree base.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn rule(&self) -> &MatchRule {
        &self.rule
    }

    /// Backend declared on this scope itself, if any.
    pub fn backend_override(&self) -> Option<TargetBackend> {
        self.backend
    }

    pub fn parent(&self) -> Option<ScopeId> {
        self.parent
    }

    /// Child scopes, in declaration order.
    pub fn children(&self) -> &[ScopeId] {
        &self.children
    }

    /// This scope's own entries (children excluded), ordered by path.
    pub fn entries(&self) -> &[TestEntry] {
        &self.entries
    }
}

/// The registry: an immutable tree of scopes.
#[derive(Clone, Debug)]
pub struct ScopeTree {
    base: PathBuf,
    default_backend: TargetBackend,
    /// Pre-order; `scopes[0]` is the root.
    scopes: Vec<Scope>,
}

impl ScopeTree {
    /// Directory every scope root is relative to.
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Backend for entries whose scopes declare no override.
    pub fn default_backend(&self) -> TargetBackend {
        self.default_backend
    }

    pub fn root(&self) -> &Scope {
        self.scope(ScopeId::ROOT)
    }

    /// Look up a scope.
    ///
    /// # Panics
    ///
    /// If `id` was not produced by this tree.
    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    /// All scope ids, parents before children.
    pub fn scope_ids(&self) -> impl Iterator<Item = ScopeId> + '_ {
        (0..self.scopes.len()).map(|i| ScopeId(u32::try_from(i).unwrap_or(u32::MAX)))
    }

    pub fn children(&self, id: ScopeId) -> impl Iterator<Item = (ScopeId, &Scope)> + '_ {
        self.scope(id)
            .children
            .iter()
            .map(move |&child| (child, self.scope(child)))
    }

    /// Every entry of the tree, scope by scope in pre-order.
    pub fn entries(&self) -> impl Iterator<Item = &TestEntry> + '_ {
        self.scopes.iter().flat_map(|scope| scope.entries.iter())
    }

    /// Number of entries in the whole tree.
    pub fn entry_count(&self) -> usize {
        self.scopes.iter().map(|scope| scope.entries.len()).sum()
    }

    /// Nearest backend override from `id` up to the root, else the default.
    pub fn resolve_backend(&self, id: ScopeId) -> TargetBackend {
        self.ancestry(id)
            .find_map(|scope| scope.backend)
            .unwrap_or(self.default_backend)
    }

    /// Scope names from the root down to `id`, joined with `::`.
    pub fn qualified_name(&self, id: ScopeId) -> String {
        let mut names: Vec<&str> = self.ancestry(id).map(Scope::name).collect();
        names.reverse();
        names.join("::")
    }

    /// Deterministic name of an entry: its scope path plus label or id.
    pub fn entry_name(&self, entry: &TestEntry) -> String {
        format!("{}::{}", self.qualified_name(entry.scope), entry.display_name())
    }

    /// Absolute (base-joined) root directory of a scope.
    pub fn scope_dir(&self, id: ScopeId) -> PathBuf {
        self.base.join(&self.scope(id).root)
    }

    /// Base-joined path of an entry's fixture.
    pub fn fixture_path(&self, entry: &TestEntry) -> PathBuf {
        self.base.join(&entry.path)
    }

    /// `id` and its ancestors, innermost first.
    fn ancestry(&self, id: ScopeId) -> impl Iterator<Item = &Scope> + '_ {
        std::iter::successors(Some(self.scope(id)), |scope| {
            scope.parent.map(|parent| self.scope(parent))
        })
    }
}
