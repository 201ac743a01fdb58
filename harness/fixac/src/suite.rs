//! Suite runner.
//!
//! One invocation runs the consistency probe once, then dispatches every
//! selected entry, sequentially or on a scoped rayon pool.

use std::time::Instant;

use parking_lot::Mutex;
use rayon::prelude::*;

use fixa_corpus::{check, ScopeTree, TestEntry};

use crate::dispatch::{dispatch, CancelToken, Cancelled};
use crate::engine::ExecutionEngine;
use crate::result::{DispatchOutcome, DispatchResult, SuiteSummary};

/// What a failed consistency probe does to the dispatches.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConsistencyPolicy {
    /// Drift fails the probe; every entry is still dispatched.
    #[default]
    Report,
    /// Drift skips every dispatch.
    Abort,
}

/// Configuration for the suite runner.
#[derive(Clone, Debug)]
pub struct SuiteConfig {
    /// Only dispatch entries whose qualified name contains this substring.
    pub filter: Option<String>,
    /// Print a line per dispatch as it completes.
    pub verbose: bool,
    /// Dispatch in parallel.
    pub parallel: bool,
    pub policy: ConsistencyPolicy,
    pub cancel: CancelToken,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        SuiteConfig {
            filter: None,
            verbose: false,
            parallel: true,
            policy: ConsistencyPolicy::Report,
            cancel: CancelToken::default(),
        }
    }
}

/// Suite runner.
///
/// Verbose progress lines come from worker threads; the counter mutex keeps
/// them whole and numbered.
pub struct SuiteRunner {
    config: SuiteConfig,
    progress: Mutex<usize>,
}

impl SuiteRunner {
    pub fn new() -> Self {
        Self::with_config(SuiteConfig::default())
    }

    pub fn with_config(config: SuiteConfig) -> Self {
        SuiteRunner {
            config,
            progress: Mutex::new(0),
        }
    }

    pub fn config(&self) -> &SuiteConfig {
        &self.config
    }

    /// Probe `tree` against the disk, then dispatch its selected entries.
    pub fn run<E>(&self, tree: &ScopeTree, engine: &E) -> Result<SuiteSummary, Cancelled>
    where
        E: ExecutionEngine + ?Sized,
    {
        let start = Instant::now();
        let mut summary = SuiteSummary::new(check(tree));

        let entries: Vec<&TestEntry> = tree.entries().filter(|e| self.selects(tree, e)).collect();
        tracing::info!(
            registered = tree.entry_count(),
            selected = entries.len(),
            consistent = summary.is_consistent(),
            "dispatching fixtures"
        );
        *self.progress.lock() = 0;

        let results = if !summary.is_consistent() && self.config.policy == ConsistencyPolicy::Abort
        {
            tracing::warn!("registry drifted from disk, skipping every dispatch");
            entries
                .iter()
                .map(|entry| DispatchResult::skipped(tree, entry, "registry drifted from disk"))
                .collect()
        } else if self.config.parallel {
            self.run_parallel(tree, engine, &entries)?
        } else {
            self.run_sequential(tree, engine, &entries)?
        };

        for result in results {
            summary.add_result(result);
        }
        summary.duration = start.elapsed();
        Ok(summary)
    }

    fn selects(&self, tree: &ScopeTree, entry: &TestEntry) -> bool {
        match &self.config.filter {
            Some(filter) => tree.entry_name(entry).contains(filter.as_str()),
            None => true,
        }
    }

    fn run_sequential<E>(
        &self,
        tree: &ScopeTree,
        engine: &E,
        entries: &[&TestEntry],
    ) -> Result<Vec<DispatchResult>, Cancelled>
    where
        E: ExecutionEngine + ?Sized,
    {
        entries
            .iter()
            .map(|entry| self.run_one(tree, engine, entry, entries.len()))
            .collect()
    }

    /// Dispatch on a scoped rayon pool, results in registry order.
    ///
    /// `build_scoped` tears the pool down before returning, which avoids
    /// the global pool's atexit hang.
    fn run_parallel<E>(
        &self,
        tree: &ScopeTree,
        engine: &E,
        entries: &[&TestEntry],
    ) -> Result<Vec<DispatchResult>, Cancelled>
    where
        E: ExecutionEngine + ?Sized,
    {
        rayon::ThreadPoolBuilder::new()
            .build_scoped(rayon::ThreadBuilder::run, |pool| {
                pool.install(|| {
                    entries
                        .par_iter()
                        .map(|entry| self.run_one(tree, engine, entry, entries.len()))
                        .collect::<Result<Vec<_>, Cancelled>>()
                })
            })
            .unwrap_or_else(|e| {
                tracing::warn!("failed to create thread pool ({e}), running sequentially");
                self.run_sequential(tree, engine, entries)
            })
    }

    fn run_one<E>(
        &self,
        tree: &ScopeTree,
        engine: &E,
        entry: &TestEntry,
        total: usize,
    ) -> Result<DispatchResult, Cancelled>
    where
        E: ExecutionEngine + ?Sized,
    {
        self.config.cancel.check()?;
        let result = dispatch(tree, entry, engine).inspect_err(|_| self.config.cancel.cancel())?;
        if self.config.verbose {
            self.report_progress(&result, total);
        }
        Ok(result)
    }

    fn report_progress(&self, result: &DispatchResult, total: usize) {
        let mut done = self.progress.lock();
        *done += 1;
        let status = match &result.outcome {
            DispatchOutcome::Passed => "PASS",
            DispatchOutcome::Failed(_) => "FAIL",
            DispatchOutcome::Skipped(_) => "SKIP",
        };
        println!(
            "[{done}/{total}] {status}: {} [{}] ({:.2?})",
            result.name, result.backend, result.duration
        );
    }
}

impl Default for SuiteRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
