use super::*;
use crate::engine::EngineError;
use fixa_corpus::{EntryDecl, MatchRule, ScopeDecl, TargetBackend};
use pretty_assertions::assert_eq;
use std::fs::{self, File};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::{tempdir, TempDir};

fn corpus(files: &[&str]) -> TempDir {
    let dir = tempdir().unwrap();
    for file in files {
        let path = dir.path().join(file);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        File::create(path).unwrap();
    }
    dir
}

fn tree(dir: &TempDir, entries: &[&str]) -> ScopeTree {
    let rule = MatchRule::files(r"(.+)\.test").unwrap();
    let decl = ScopeDecl::new("", rule).entries(entries.iter().map(|e| EntryDecl::new(*e)));
    ScopeTree::build(dir.path(), TargetBackend::Jvm, decl).unwrap()
}

fn fails_on_b(fixture: &Path, _: TargetBackend) -> Result<(), EngineError> {
    if fixture.ends_with("b.test") {
        Err(EngineError::failed("expected OK"))
    } else {
        Ok(())
    }
}

fn sequential() -> SuiteConfig {
    SuiteConfig {
        parallel: false,
        ..SuiteConfig::default()
    }
}

fn outcomes(summary: &SuiteSummary) -> Vec<(&str, bool)> {
    summary
        .results
        .iter()
        .map(|r| (r.name.as_str(), r.outcome.is_passed()))
        .collect()
}

#[test]
fn test_parallel_matches_sequential() {
    let files = ["a.test", "b.test", "c.test", "d.test", "e.test"];
    let dir = corpus(&files);
    let tree = tree(&dir, &files);

    let parallel = SuiteRunner::new().run(&tree, &fails_on_b).unwrap();
    let serial = SuiteRunner::with_config(sequential())
        .run(&tree, &fails_on_b)
        .unwrap();

    assert_eq!(outcomes(&parallel), outcomes(&serial));
    assert_eq!(
        outcomes(&serial),
        vec![
            ("Root::A", true),
            ("Root::B", false),
            ("Root::C", true),
            ("Root::D", true),
            ("Root::E", true),
        ]
    );
    assert_eq!((serial.passed, serial.failed), (4, 1));
    assert_eq!(serial.exit_code(), 1);
}

#[test]
fn test_filter_selects_by_qualified_name() {
    let dir = corpus(&["alpha.test", "beta.test"]);
    let tree = tree(&dir, &["alpha.test", "beta.test"]);
    let runner = SuiteRunner::with_config(SuiteConfig {
        filter: Some("::Bet".to_string()),
        ..sequential()
    });
    let summary = runner.run(&tree, &fails_on_b).unwrap();
    assert_eq!(outcomes(&summary), vec![("Root::Beta", true)]);
}

#[test]
fn test_drift_is_reported_but_dispatch_continues() {
    let dir = corpus(&["a.test", "extra.test"]);
    let tree = tree(&dir, &["a.test"]);
    let summary = SuiteRunner::new().run(&tree, &fails_on_b).unwrap();
    assert!(!summary.is_consistent());
    assert_eq!(summary.passed, 1);
    assert_eq!(summary.exit_code(), 1);
}

#[test]
fn test_abort_policy_skips_every_dispatch() {
    let dir = corpus(&["a.test", "extra.test"]);
    let tree = tree(&dir, &["a.test"]);
    let calls = AtomicUsize::new(0);
    let engine = |_: &Path, _: TargetBackend| -> Result<(), EngineError> {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    };
    let runner = SuiteRunner::with_config(SuiteConfig {
        policy: ConsistencyPolicy::Abort,
        ..SuiteConfig::default()
    });

    let summary = runner.run(&tree, &engine).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(summary.skipped, 1);
    assert!(summary.results[0].outcome.is_skipped());
}

#[test]
fn test_abort_policy_runs_when_consistent() {
    let dir = corpus(&["a.test"]);
    let tree = tree(&dir, &["a.test"]);
    let runner = SuiteRunner::with_config(SuiteConfig {
        policy: ConsistencyPolicy::Abort,
        ..sequential()
    });
    let summary = runner.run(&tree, &fails_on_b).unwrap();
    assert_eq!(summary.passed, 1);
    assert_eq!(summary.exit_code(), 0);
}

#[test]
fn test_cancelled_token_stops_the_run() {
    let dir = corpus(&["a.test"]);
    let tree = tree(&dir, &["a.test"]);
    let config = sequential();
    config.cancel.cancel();
    assert_eq!(
        SuiteRunner::with_config(config).run(&tree, &fails_on_b).unwrap_err(),
        Cancelled
    );
}

#[test]
fn test_engine_cancellation_stops_the_run() {
    let files = ["a.test", "b.test", "c.test"];
    let dir = corpus(&files);
    let tree = tree(&dir, &files);
    let calls = AtomicUsize::new(0);
    let engine = |fixture: &Path, _: TargetBackend| -> Result<(), EngineError> {
        calls.fetch_add(1, Ordering::SeqCst);
        if fixture.ends_with("b.test") {
            Err(EngineError::Cancelled)
        } else {
            Ok(())
        }
    };

    let runner = SuiteRunner::with_config(sequential());
    assert_eq!(runner.run(&tree, &engine).unwrap_err(), Cancelled);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(runner.config().cancel.is_cancelled());
}

#[test]
fn test_empty_registry() {
    let dir = corpus(&[]);
    let tree = tree(&dir, &[]);
    let summary = SuiteRunner::new().run(&tree, &fails_on_b).unwrap();
    assert!(summary.is_consistent());
    assert_eq!(summary.exit_code(), 2);
}
