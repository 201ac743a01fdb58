//! Dispatching one registry entry to an engine.
//!
//! A dispatch is a pure function of the entry and the engine: it resolves the
//! fixture path and backend from the tree, calls the engine once, and turns
//! the engine's answer into a [`DispatchResult`]. Cancellation is not an
//! outcome; it aborts the run.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use fixa_corpus::{ScopeTree, TestEntry};

use crate::engine::{EngineError, ExecutionEngine};
use crate::result::{DispatchOutcome, DispatchResult};

/// The run was cancelled before every entry was dispatched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("run cancelled")]
pub struct Cancelled;

/// Shared cancellation flag, checked before every dispatch.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        CancelToken::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled)` once [`cancel`](Self::cancel) has been called.
    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Hand `entry` to `engine` with its resolved backend.
///
/// The engine receives the base-joined fixture path.
#[tracing::instrument(
    level = "debug",
    skip_all,
    fields(fixture = %entry.path().display(), backend = %entry.backend())
)]
pub fn dispatch<E>(
    tree: &ScopeTree,
    entry: &TestEntry,
    engine: &E,
) -> Result<DispatchResult, Cancelled>
where
    E: ExecutionEngine + ?Sized,
{
    let start = Instant::now();
    let outcome = match engine.execute(&tree.fixture_path(entry), entry.backend()) {
        Ok(()) => DispatchOutcome::Passed,
        Err(EngineError::Failed(failure)) => {
            tracing::debug!(error = %failure.message, "fixture failed");
            DispatchOutcome::Failed(failure)
        }
        Err(EngineError::Cancelled) => {
            tracing::debug!("engine reported cancellation");
            return Err(Cancelled);
        }
    };

    Ok(DispatchResult {
        name: tree.entry_name(entry),
        path: entry.path().to_path_buf(),
        backend: entry.backend(),
        outcome,
        duration: start.elapsed(),
    })
}
