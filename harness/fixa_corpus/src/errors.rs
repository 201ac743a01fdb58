//! Error types for corpus discovery and registry construction.

use std::io;
use std::path::PathBuf;

use crate::id::FixtureId;

/// Failure to enumerate fixtures under a scope root.
///
/// Fatal for the scope being checked and for all of its descendants.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LocatorError {
    /// The scope root does not exist.
    #[error("fixture root '{}' does not exist", root.display())]
    Missing { root: PathBuf },
    /// The scope root exists but is not a directory.
    #[error("fixture root '{}' is not a directory", root.display())]
    NotADirectory { root: PathBuf },
    /// A directory inside the root could not be listed.
    #[error("cannot read '{}': {message}", path.display())]
    Unreadable {
        path: PathBuf,
        kind: io::ErrorKind,
        message: String,
    },
    /// A directory entry has a name that is not valid UTF-8.
    #[error("fixture candidate '{}' has a non UTF-8 name", path.display())]
    NonUtf8Name { path: PathBuf },
}

impl LocatorError {
    pub(crate) fn unreadable(path: PathBuf, err: &io::Error) -> Self {
        LocatorError::Unreadable {
            path,
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// A malformed registry.
///
/// Raised while building a [`ScopeTree`](crate::ScopeTree); a tree that
/// fails to build never runs.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RegistryDefect {
    /// A scope's name pattern or exclude pattern does not compile.
    #[error("invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
    /// An entry path is absolute, empty, or escapes its scope root.
    #[error("scope '{scope}': entry path '{}' must be relative to the scope root", path.display())]
    InvalidEntryPath { scope: String, path: PathBuf },
    /// An entry path can never be located by the scope's rule.
    #[error(
        "scope '{scope}': entry '{}' is not matched by the scope rule ({reason})",
        path.display()
    )]
    EntryRejectedByRule {
        scope: String,
        path: PathBuf,
        reason: &'static str,
    },
    /// An entry lies under the root of one of the scope's children.
    #[error(
        "scope '{scope}': entry '{}' belongs to child scope '{child}'",
        path.display()
    )]
    EntryClaimedByChild {
        scope: String,
        child: String,
        path: PathBuf,
    },
    /// Two entries of one scope normalize to the same identifier.
    #[error(
        "scope '{scope}': '{}' and '{}' both normalize to fixture id '{id}'",
        first.display(),
        second.display()
    )]
    DuplicateId {
        scope: String,
        id: FixtureId,
        first: PathBuf,
        second: PathBuf,
    },
    /// A label repeats within a scope or one of its ancestors.
    #[error("scope '{scope}': label '{label}' is already used on the path to the root scope")]
    DuplicateLabel { scope: String, label: String },
    /// A child scope root is not strictly below its parent's root.
    #[error(
        "scope '{child}': root '{}' is not below parent root '{}'",
        child_root.display(),
        parent_root.display()
    )]
    ChildOutsideParent {
        child: String,
        child_root: PathBuf,
        parent_root: PathBuf,
    },
    /// Two sibling scopes claim overlapping directories.
    #[error(
        "sibling scopes '{first}' and '{second}' overlap at '{}'",
        root.display()
    )]
    OverlappingScopes {
        first: String,
        second: String,
        root: PathBuf,
    },
}

/// Failure to load a registry manifest.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("cannot read manifest '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed manifest: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Registry(#[from] RegistryDefect),
}

/// Failure to snapshot a corpus into a manifest.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error(transparent)]
    Locator(#[from] LocatorError),
    #[error(transparent)]
    Registry(#[from] RegistryDefect),
}
