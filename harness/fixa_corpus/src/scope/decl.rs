//! Declarative scope descriptions, the input to [`ScopeTree::build`].
//!
//! [`ScopeTree::build`]: super::ScopeTree::build

use std::path::PathBuf;

use crate::backend::TargetBackend;
use crate::locate::MatchRule;

/// One declared fixture of a scope.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntryDecl {
    /// Relative to the scope root.
    pub path: PathBuf,
    pub label: Option<String>,
}

impl EntryDecl {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        EntryDecl {
            path: path.into(),
            label: None,
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// A scope as declared by an author or by the snapshot generator.
///
/// ```text
/// ScopeDecl::new("testData/callableReference", MatchRule::files(r"(.+)\.kt")?)
///     .entry("topLevel.kt")
///     .child(
///         ScopeDecl::new("testData/callableReference/bound", rule)
///             .backend(TargetBackend::JsIr)
///             .entry("simple.kt"),
///     )
/// ```
#[derive(Clone, Debug)]
pub struct ScopeDecl {
    pub(super) name: Option<String>,
    pub(super) root: PathBuf,
    pub(super) rule: MatchRule,
    pub(super) backend: Option<TargetBackend>,
    pub(super) entries: Vec<EntryDecl>,
    pub(super) children: Vec<ScopeDecl>,
}

impl ScopeDecl {
    /// A scope rooted at `root` (relative to the tree base).
    pub fn new(root: impl Into<PathBuf>, rule: MatchRule) -> Self {
        ScopeDecl {
            name: None,
            root: root.into(),
            rule,
            backend: None,
            entries: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Override the display name (defaults to the root's last component).
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Override the target backend for this scope and its descendants.
    #[must_use]
    pub fn backend(mut self, backend: TargetBackend) -> Self {
        self.backend = Some(backend);
        self
    }

    #[must_use]
    pub fn entry(mut self, path: impl Into<PathBuf>) -> Self {
        self.entries.push(EntryDecl::new(path));
        self
    }

    #[must_use]
    pub fn labeled_entry(mut self, path: impl Into<PathBuf>, label: impl Into<String>) -> Self {
        self.entries.push(EntryDecl::new(path).with_label(label));
        self
    }

    #[must_use]
    pub fn entries(mut self, entries: impl IntoIterator<Item = EntryDecl>) -> Self {
        self.entries.extend(entries);
        self
    }

    #[must_use]
    pub fn child(mut self, child: ScopeDecl) -> Self {
        self.children.push(child);
        self
    }
}
