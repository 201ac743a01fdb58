//! Fixa Corpus - fixture discovery and registry consistency
//!
//! A test corpus is a directory tree of fixtures. The registry (a
//! [`ScopeTree`]) declares which fixtures are expected, scope by scope. This
//! crate finds what is actually on disk and reports where the two disagree.
//! It never executes anything; see the `fixac` driver for that.
//!
//! # Architecture
//!
//! ```text
//! Manifest / ScopeDecl
//!     │
//!     ▼
//! ScopeTree::build() ──► ScopeTree (validated, immutable)
//!     │
//!     ▼
//! check() ──► locate() per scope ──► normalize() ──► diff
//!     │
//!     ▼
//! ConsistencyReport
//! ```
//!
//! The filesystem is the source of truth; nothing here caches disk state.

pub mod backend;
pub mod check;
pub mod errors;
pub mod id;
pub mod locate;
pub mod manifest;
pub mod scope;
pub mod snapshot;

pub use backend::{TargetBackend, UnknownBackend};
pub use check::{
    check, check_scope, ConsistencyFailure, ConsistencyReport, IdCollision, ScopeFindings,
    ScopeOutcome, ScopeReport, StaleEntry,
};
pub use errors::{LocatorError, ManifestError, RegistryDefect, SnapshotError};
pub use id::{collision_key, normalize, FixtureId};
pub use locate::{locate, LocateMode, MatchRule};
pub use manifest::{EntryManifest, Manifest, ScopeManifest};
pub use scope::{EntryDecl, Scope, ScopeDecl, ScopeId, ScopeTree, TestEntry};
pub use snapshot::{snapshot, SnapshotOptions};
