//! Dispatch result types.

use std::path::PathBuf;
use std::time::Duration;

use fixa_corpus::{ConsistencyReport, ScopeTree, TargetBackend, TestEntry};

use crate::engine::ExecutionFailure;

/// Outcome of a single dispatch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The engine accepted the fixture.
    Passed,
    /// The engine reported a failure.
    Failed(ExecutionFailure),
    /// Not executed, with a reason.
    Skipped(String),
}

impl DispatchOutcome {
    pub fn is_passed(&self) -> bool {
        matches!(self, DispatchOutcome::Passed)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, DispatchOutcome::Failed(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, DispatchOutcome::Skipped(_))
    }
}

/// Result of dispatching one registry entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DispatchResult {
    /// Qualified name (`Scope::Inner::Id`).
    pub name: String,
    /// Fixture path relative to the tree base.
    pub path: PathBuf,
    pub backend: TargetBackend,
    pub outcome: DispatchOutcome,
    pub duration: Duration,
}

impl DispatchResult {
    /// A result for an entry that was never handed to the engine.
    #[cold]
    pub fn skipped(tree: &ScopeTree, entry: &TestEntry, reason: impl Into<String>) -> Self {
        DispatchResult {
            name: tree.entry_name(entry),
            path: entry.path().to_path_buf(),
            backend: entry.backend(),
            outcome: DispatchOutcome::Skipped(reason.into()),
            duration: Duration::ZERO,
        }
    }
}

/// Everything one suite invocation produced.
#[derive(Clone, Debug, Default)]
pub struct SuiteSummary {
    /// The "all fixtures present" probe, run before any dispatch.
    pub consistency: ConsistencyReport,
    /// Dispatch results in registry order.
    pub results: Vec<DispatchResult>,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Wall time for probe and dispatches.
    pub duration: Duration,
}

impl SuiteSummary {
    pub fn new(consistency: ConsistencyReport) -> Self {
        SuiteSummary {
            consistency,
            ..Default::default()
        }
    }

    pub fn add_result(&mut self, result: DispatchResult) {
        match &result.outcome {
            DispatchOutcome::Passed => self.passed += 1,
            DispatchOutcome::Failed(_) => self.failed += 1,
            DispatchOutcome::Skipped(_) => self.skipped += 1,
        }
        self.results.push(result);
    }

    pub fn total(&self) -> usize {
        self.passed + self.failed + self.skipped
    }

    pub fn is_consistent(&self) -> bool {
        self.consistency.is_consistent()
    }

    /// A failed dispatch or a failed consistency probe.
    pub fn has_failures(&self) -> bool {
        self.failed > 0 || !self.is_consistent()
    }

    /// Get exit code: 0 = all pass, 1 = failures or drift, 2 = nothing dispatched.
    pub fn exit_code(&self) -> i32 {
        if self.total() == 0 && self.is_consistent() {
            2
        } else {
            i32::from(self.has_failures())
        }
    }
}
